//! Contract scan service.
//!
//! Ties a [`BytecodeSource`] and a [`TvlSource`] to the classifier, the
//! per-family [`LevelTable`] and the TTL cache. One `ContractScanner` is meant to be shared:
//! every method takes `&self`.

use std::time::Duration;

use serde::Serialize;

use crate::cache::ScanCache;
use crate::catalog::LevelTable;
use crate::config::ScannerFullConfig;
use crate::error::{ScanError, SourceError};
use crate::fingerprint::classify;
use crate::metrics::ScanMetrics;
use crate::source::{BytecodeSource, TvlSource};
use crate::types::{ContractInfo, DEFAULT_CHAIN, Severity, now_unix_secs, parse_address};

/// Default pause between consecutive bulk scan requests.
pub const DEFAULT_BULK_DELAY: Duration = Duration::from_millis(200);

pub struct ContractScanner<B, T> {
    bytecode: B,
    tvl: T,
    levels: LevelTable,
    cache: ScanCache,
    metrics: ScanMetrics,
    chain: String,
    bulk_delay: Duration,
}

impl<B: BytecodeSource, T: TvlSource> ContractScanner<B, T> {
    pub fn new(bytecode: B, tvl: T) -> Self {
        Self {
            bytecode,
            tvl,
            levels: LevelTable::builtin(),
            cache: ScanCache::default(),
            metrics: ScanMetrics::new(),
            chain: DEFAULT_CHAIN.to_string(),
            bulk_delay: DEFAULT_BULK_DELAY,
        }
    }

    /// Scanner with cache, chain and bulk pacing taken from `config`.
    pub fn from_config(bytecode: B, tvl: T, config: &ScannerFullConfig) -> Self {
        Self::new(bytecode, tvl)
            .with_cache(config.to_cache())
            .with_chain(config.chain.clone())
            .with_bulk_delay(config.bulk_delay())
    }

    /// Replace the table used to level scanned contracts.
    pub fn with_levels(mut self, levels: LevelTable) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_cache(mut self, cache: ScanCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = chain.into();
        self
    }

    /// Pause inserted between bulk requests; `Duration::ZERO` disables it.
    pub fn with_bulk_delay(mut self, delay: Duration) -> Self {
        self.bulk_delay = delay;
        self
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Scan cache cleared");
    }

    /// Scan one contract.
    ///
    /// A fresh cache entry is returned without touching the sources. When a
    /// source fails, any cached entry for the key is returned instead, with
    /// `last_scanned` refreshed.
    pub fn scan(&self, address: &str, protocol: &str) -> Result<ContractInfo, ScanError> {
        parse_address(address)?;
        self.metrics.increment_scans_requested();

        if let Some(cached) = self.cache.get_fresh(address, protocol) {
            self.metrics.increment_cache_hits();
            tracing::debug!(address, protocol, "Serving scan from cache");
            return Ok(cached);
        }

        match self.fetch(address, protocol) {
            Ok(info) => {
                self.metrics.increment_contracts_classified();
                self.cache.insert(address, protocol, info.clone());
                Ok(info)
            }
            Err(source) => {
                if let Some(mut stale) = self.cache.get_stale(address, protocol) {
                    self.metrics.increment_stale_fallbacks();
                    tracing::warn!(
                        address,
                        protocol,
                        error = %source,
                        "Source failed, serving stale scan"
                    );
                    stale.last_scanned = now_unix_secs();
                    return Ok(stale);
                }
                self.metrics.increment_source_failures();
                tracing::error!(address, protocol, error = %source, "Contract scan failed");
                Err(ScanError::TransientSourceFailure {
                    address: address.to_string(),
                    source,
                })
            }
        }
    }

    /// Scan many contracts one after another.
    ///
    /// Failed scans are logged and left out of the result; order of the
    /// successful scans follows the input.
    pub fn bulk_scan(&self, requests: &[(String, String)]) -> Vec<ContractInfo> {
        let mut results = Vec::with_capacity(requests.len());

        for (i, (address, protocol)) in requests.iter().enumerate() {
            if i > 0 && !self.bulk_delay.is_zero() {
                std::thread::sleep(self.bulk_delay);
            }
            match self.scan(address, protocol) {
                Ok(info) => results.push(info),
                Err(e) => tracing::warn!(
                    address = %address,
                    protocol = %protocol,
                    error = %e,
                    "Skipping contract in bulk scan"
                ),
            }
        }

        tracing::info!(
            requested = requests.len(),
            scanned = results.len(),
            "Bulk scan complete"
        );
        results
    }

    fn fetch(&self, address: &str, protocol: &str) -> Result<ContractInfo, SourceError> {
        let code = self.bytecode.get_code(address)?;
        let fingerprint = classify(&code);
        let risk_level = self.levels.level(fingerprint.family, &fingerprint.version);
        let tvl = self.tvl.get_tvl(protocol)?;

        tracing::debug!(
            address,
            compiler = %fingerprint.family,
            version = %fingerprint.version,
            level = %risk_level,
            "Classified contract"
        );

        Ok(ContractInfo {
            address: address.to_string(),
            compiler: fingerprint.family,
            version: fingerprint.version,
            protocol: protocol.to_string(),
            tvl,
            risk_level,
            chain: self.chain.clone(),
            last_scanned: now_unix_secs(),
        })
    }
}

/// Per-level counts over a set of scanned contracts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl BulkSummary {
    pub fn from_results(results: &[ContractInfo]) -> Self {
        results.iter().fold(Self::default(), |mut summary, info| {
            summary.total += 1;
            match info.risk_level {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            summary
        })
    }
}
