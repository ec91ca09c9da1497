//! External collaborators consumed by the scanner.
//!
//! Implementations own their retry policy: by the time an error reaches the
//! scanner, retries are exhausted.

use rustc_hash::FxHashMap;

use crate::error::SourceError;

/// Fetches deployed bytecode for an address.
pub trait BytecodeSource {
    /// Returns `0x`-prefixed hex; `"0x"` when the address holds no code.
    fn get_code(&self, address: &str) -> Result<String, SourceError>;
}

/// Resolves a protocol's total value locked, in USD.
pub trait TvlSource {
    /// Unknown protocols must resolve to a default rather than fail.
    fn get_tvl(&self, protocol: &str) -> Result<f64, SourceError>;
}

impl<S: BytecodeSource + ?Sized> BytecodeSource for &S {
    fn get_code(&self, address: &str) -> Result<String, SourceError> {
        (**self).get_code(address)
    }
}

impl<S: TvlSource + ?Sized> TvlSource for &S {
    fn get_tvl(&self, protocol: &str) -> Result<f64, SourceError> {
        (**self).get_tvl(protocol)
    }
}

/// TVL assumed for protocols missing from the table.
pub const DEFAULT_TVL_USD: f64 = 1_000_000.0;

/// Static TVL table with a default for unlisted protocols.
#[derive(Debug, Clone)]
pub struct StaticTvlSource {
    table: FxHashMap<String, f64>,
    default_usd: f64,
}

impl StaticTvlSource {
    pub fn new(default_usd: f64) -> Self {
        Self {
            table: FxHashMap::default(),
            default_usd,
        }
    }

    /// Table preloaded with reference TVL figures for well-known protocols.
    pub fn with_reference_values() -> Self {
        let mut source = Self::new(DEFAULT_TVL_USD);
        for (protocol, tvl) in [
            ("Curve Finance", 24.7e6),
            ("Yearn Finance", 18.2e6),
            ("Balancer", 12.5e6),
            ("Aave", 15.3e6),
            ("Compound", 8.9e6),
            ("Chainlink", 1e6),
            ("Test Protocol", 5e6),
            ("Vulnerable Protocol 1", 15.2e6),
            ("Vulnerable Protocol 2", 8.7e6),
            ("Vulnerable Protocol 3", 12.3e6),
        ] {
            source.set(protocol, tvl);
        }
        source
    }

    pub fn with_default_usd(mut self, default_usd: f64) -> Self {
        self.default_usd = default_usd;
        self
    }

    pub fn set(&mut self, protocol: impl Into<String>, tvl_usd: f64) {
        self.table.insert(protocol.into(), tvl_usd);
    }

    pub fn default_usd(&self) -> f64 {
        self.default_usd
    }
}

impl Default for StaticTvlSource {
    fn default() -> Self {
        Self::with_reference_values()
    }
}

impl TvlSource for StaticTvlSource {
    fn get_tvl(&self, protocol: &str) -> Result<f64, SourceError> {
        // Zero is treated as "no data", matching the reference dashboard.
        Ok(self
            .table
            .get(protocol)
            .copied()
            .filter(|tvl| *tvl > 0.0)
            .unwrap_or(self.default_usd))
    }
}

/// In-memory bytecode store keyed by lowercase address.
#[derive(Debug, Clone, Default)]
pub struct StaticBytecodeSource {
    codes: FxHashMap<String, String>,
}

impl StaticBytecodeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: &str, code: impl Into<String>) {
        self.codes.insert(address.to_ascii_lowercase(), code.into());
    }
}

impl BytecodeSource for StaticBytecodeSource {
    fn get_code(&self, address: &str) -> Result<String, SourceError> {
        Ok(self
            .codes
            .get(&address.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| "0x".to_string()))
    }
}
