//! TOML-compatible configuration for the scanner.
//!
//! `ScannerFullConfig` gathers every tunable into one TOML-deserializable
//! struct. Durations are kept as plain integers so the file stays readable.
//!
//! ```toml
//! [tvlscan]
//! chain = "ethereum"
//!
//! [tvlscan.cache]
//! ttl_secs = 300
//! capacity = 1024
//!
//! [tvlscan.tvl]
//! default_usd = 1000000.0
//! overrides = { "Curve Finance" = 24700000.0 }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL, ScanCache};
use crate::source::{DEFAULT_TVL_USD, StaticTvlSource};
use crate::types::DEFAULT_CHAIN;

/// Top-level scanner configuration, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerFullConfig {
    /// Chain name recorded on every scan.
    pub chain: String,
    /// JSON-RPC endpoint; the CLI flag or `ETHEREUM_RPC_URL` take precedence.
    pub rpc_url: Option<String>,
    pub cache: CacheConfig,
    pub bulk: BulkConfig,
    pub rpc: RpcTomlConfig,
    pub tvl: TvlConfig,
}

impl Default for ScannerFullConfig {
    fn default() -> Self {
        Self {
            chain: DEFAULT_CHAIN.to_string(),
            rpc_url: None,
            cache: CacheConfig::default(),
            bulk: BulkConfig::default(),
            rpc: RpcTomlConfig::default(),
            tvl: TvlConfig::default(),
        }
    }
}

impl ScannerFullConfig {
    /// Validate configuration values, returning an error message on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.chain.trim().is_empty() {
            return Err("chain must not be empty".to_string());
        }
        if self.cache.capacity == 0 {
            return Err("cache.capacity must be > 0".to_string());
        }
        if self.rpc.timeout_secs == 0 {
            return Err("rpc.timeout_secs must be > 0".to_string());
        }
        if self.rpc.connect_timeout_secs == 0 {
            return Err("rpc.connect_timeout_secs must be > 0".to_string());
        }
        if !self.tvl.default_usd.is_finite() || self.tvl.default_usd < 0.0 {
            return Err(format!(
                "tvl.default_usd must be a non-negative number, got {}",
                self.tvl.default_usd
            ));
        }
        if let Some((protocol, value)) = self
            .tvl
            .overrides
            .iter()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(format!(
                "tvl.overrides[{protocol:?}] must be a non-negative number, got {value}"
            ));
        }
        if let Some(url) = &self.rpc_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(format!("rpc_url must be an http(s) URL, got {url:?}"));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn bulk_delay(&self) -> Duration {
        Duration::from_millis(self.bulk.delay_ms)
    }

    pub fn to_cache(&self) -> ScanCache {
        ScanCache::new(self.cache_ttl(), self.cache.capacity)
    }

    /// Reference TVL table with the configured default and overrides applied.
    pub fn to_tvl_source(&self) -> StaticTvlSource {
        let mut source =
            StaticTvlSource::with_reference_values().with_default_usd(self.tvl.default_usd);
        for (protocol, value) in &self.tvl.overrides {
            source.set(protocol.clone(), *value);
        }
        source
    }
}

/// Scan cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window in seconds (default: 300).
    pub ttl_secs: u64,
    /// Maximum cached scans (default: 1024).
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Bulk scan pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    /// Pause between consecutive requests in milliseconds, 0 disables (default: 200).
    pub delay_ms: u64,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self { delay_ms: 200 }
    }
}

/// JSON-RPC client settings (TOML-friendly).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcTomlConfig {
    /// Per-request timeout in seconds (default: 30).
    pub timeout_secs: u64,
    /// Connection timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Retries for transient errors (default: 3).
    pub max_retries: u32,
    /// Base backoff in milliseconds, doubled each retry (default: 1000).
    pub base_backoff_ms: u64,
}

impl Default for RpcTomlConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            base_backoff_ms: 1000,
        }
    }
}

/// TVL lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TvlConfig {
    /// TVL assumed for protocols without data (default: 1_000_000).
    pub default_usd: f64,
    /// Per-protocol TVL in USD, layered over the reference table.
    pub overrides: BTreeMap<String, f64>,
}

impl Default for TvlConfig {
    fn default() -> Self {
        Self {
            default_usd: DEFAULT_TVL_USD,
            overrides: BTreeMap::new(),
        }
    }
}

/// Load a `ScannerFullConfig` from an optional TOML file path.
///
/// If `path` is `None`, returns the default config.
pub fn load_config(path: Option<&PathBuf>) -> Result<ScannerFullConfig, String> {
    let Some(path) = path else {
        return Ok(ScannerFullConfig::default());
    };

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read tvlscan config from {}: {}", path.display(), e))?;

    let wrapper: TomlWrapper = toml::from_str(&contents)
        .map_err(|e| format!("Failed to parse tvlscan TOML config: {e}"))?;

    let config = wrapper.tvlscan.unwrap_or_default();
    config.validate()?;
    Ok(config)
}

/// Top-level TOML structure: `[tvlscan]` table.
#[derive(Debug, Deserialize)]
struct TomlWrapper {
    tvlscan: Option<ScannerFullConfig>,
}

/// Merge CLI overrides into a loaded (or default) config.
///
/// CLI flags take precedence over TOML values.
pub fn merge_cli_overrides(
    config: &ScannerFullConfig,
    cli_rpc_url: Option<&str>,
    cli_chain: Option<&str>,
    cli_bulk_delay_ms: Option<u64>,
) -> ScannerFullConfig {
    let mut merged = config.clone();

    if let Some(url) = cli_rpc_url {
        merged.rpc_url = Some(url.to_string());
    }
    if let Some(chain) = cli_chain {
        merged.chain = chain.to_string();
    }
    if let Some(delay) = cli_bulk_delay_ms {
        merged.bulk.delay_ms = delay;
    }

    merged
}
