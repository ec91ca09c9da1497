//! tvlscan scanner core
//!
//! Fingerprints the compiler of deployed contracts from their bytecode, maps
//! compiler versions to a severity-ranked vulnerability catalog and derives a
//! per-protocol risk score with an estimate of the TVL exposed.
//!
//! Bytecode and TVL acquisition are external collaborators, see [`source`].

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod metrics;
pub mod risk;
pub mod scanner;
pub mod source;
pub mod types;

pub use catalog::{LevelTable, RuleCatalog};
pub use error::{ScanError, SourceError};
pub use fingerprint::{CompilerFingerprint, classify};
pub use risk::RiskEngine;
pub use scanner::ContractScanner;
pub use types::{CompilerFamily, ContractInfo, RiskScore, Severity, VulnerabilityRule};

#[cfg(test)]
mod tests;
