//! Scan counters with Prometheus text rendering.
//!
//! Lock-free `AtomicU64` counters shared by all callers of a scanner.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for the contract scanner.
#[derive(Debug, Default)]
pub struct ScanMetrics {
    /// Scan requests received (cache hits included).
    scans_requested: AtomicU64,
    /// Scans served from a fresh cache entry.
    cache_hits: AtomicU64,
    /// Scans that fetched bytecode and classified it.
    contracts_classified: AtomicU64,
    /// Source failures answered with an expired cache entry.
    stale_fallbacks: AtomicU64,
    /// Source failures surfaced to the caller.
    source_failures: AtomicU64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_scans_requested(&self) {
        self.scans_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_contracts_classified(&self) {
        self.contracts_classified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stale_fallbacks(&self) {
        self.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_source_failures(&self) {
        self.source_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy; each counter is read independently.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scans_requested: self.scans_requested.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            contracts_classified: self.contracts_classified.load(Ordering::Relaxed),
            stale_fallbacks: self.stale_fallbacks.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
        }
    }

    pub fn to_prometheus_text(&self) -> String {
        self.snapshot().to_prometheus_text()
    }
}

const _: fn() = || {
    fn must_be_send_sync<T: Send + Sync>() {}
    must_be_send_sync::<ScanMetrics>();
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub scans_requested: u64,
    pub cache_hits: u64,
    pub contracts_classified: u64,
    pub stale_fallbacks: u64,
    pub source_failures: u64,
}

impl MetricsSnapshot {
    /// Percentage of requests answered from a fresh cache entry.
    pub fn cache_hit_rate_percent(&self) -> f64 {
        if self.scans_requested == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.scans_requested as f64 * 100.0
    }

    pub fn to_prometheus_text(&self) -> String {
        let mut out = String::with_capacity(512);
        write_counter(
            &mut out,
            "tvlscan_scans_requested",
            "Contract scan requests received",
            self.scans_requested,
        );
        write_counter(
            &mut out,
            "tvlscan_cache_hits",
            "Scans served from a fresh cache entry",
            self.cache_hits,
        );
        write_counter(
            &mut out,
            "tvlscan_contracts_classified",
            "Contracts fetched and fingerprinted",
            self.contracts_classified,
        );
        write_counter(
            &mut out,
            "tvlscan_stale_fallbacks",
            "Source failures answered from an expired cache entry",
            self.stale_fallbacks,
        );
        write_counter(
            &mut out,
            "tvlscan_source_failures",
            "Source failures surfaced to the caller",
            self.source_failures,
        );
        out
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan Metrics")?;
        writeln!(f, "  scans_requested:      {}", self.scans_requested)?;
        writeln!(
            f,
            "  cache_hits:           {} ({:.1}%)",
            self.cache_hits,
            self.cache_hit_rate_percent()
        )?;
        writeln!(f, "  contracts_classified: {}", self.contracts_classified)?;
        writeln!(f, "  stale_fallbacks:      {}", self.stale_fallbacks)?;
        write!(f, "  source_failures:      {}", self.source_failures)
    }
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
}
