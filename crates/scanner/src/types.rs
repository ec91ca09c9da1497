//! Core data model shared by the classifier, the catalog and the risk engine.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use ethereum_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Version sentinel used when no known version string is found in bytecode.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Chain recorded on scans when the configuration does not override it.
pub const DEFAULT_CHAIN: &str = "ethereum";

/// Compiler family detected from contract bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
    Solidity,
    Vyper,
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilerFamily::Solidity => write!(f, "solidity"),
            CompilerFamily::Vyper => write!(f, "vyper"),
        }
    }
}

/// Ordered severity, used both for vulnerability rules and for risk levels.
///
/// Variant order is significant: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Points added to a protocol's risk score for each matched rule.
    pub fn score_weight(self) -> u32 {
        match self {
            Severity::Critical => 40,
            Severity::High => 25,
            Severity::Medium => 15,
            Severity::Low => 5,
        }
    }

    /// Ordinal used for exposure estimation (no match counts as 0).
    pub fn rank(self) -> u32 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    /// Risk level for a clamped 0-100 score.
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            Severity::Critical
        } else if score >= 60 {
            Severity::High
        } else if score >= 30 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            "LOW" => Ok(Severity::Low),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// One scanned contract snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    /// `0x`-prefixed hex of the 20-byte contract address.
    pub address: String,
    pub compiler: CompilerFamily,
    /// Dotted version string or [`UNKNOWN_VERSION`].
    pub version: String,
    pub protocol: String,
    /// Total value locked, in USD.
    pub tvl: f64,
    pub risk_level: Severity,
    pub chain: String,
    /// Unix timestamp (seconds) of the scan.
    pub last_scanned: u64,
}

impl ContractInfo {
    pub fn has_known_version(&self) -> bool {
        self.version != UNKNOWN_VERSION
    }
}

/// A vulnerability catalog entry keyed by compiler version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRule {
    pub id: String,
    pub compiler_versions: Vec<String>,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_functions: Option<Vec<String>>,
}

impl VulnerabilityRule {
    pub fn new(
        id: impl Into<String>,
        compiler_versions: &[&str],
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            compiler_versions: compiler_versions.iter().map(|v| v.to_string()).collect(),
            severity,
            description: description.into(),
            affected_functions: None,
        }
    }

    pub fn with_affected_functions(mut self, functions: &[&str]) -> Self {
        self.affected_functions = Some(functions.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Whether this rule lists `version` among its compiler versions.
    pub fn applies_to(&self, version: &str) -> bool {
        self.compiler_versions.iter().any(|v| v == version)
    }
}

/// Result of assessing one protocol's contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    pub protocol: String,
    /// Clamped to 0..=100.
    pub overall_score: u32,
    pub risk_level: Severity,
    /// Every match across the batch, duplicates included.
    pub vulnerabilities: Vec<VulnerabilityRule>,
    pub tvl_at_risk: f64,
    pub last_updated: u64,
    pub recommendations: Vec<String>,
}

/// Dashboard bucket for a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProtocolStatus {
    Critical,
    High,
    Medium,
    Low,
    Safe,
}

impl fmt::Display for ProtocolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ProtocolStatus::Critical => "CRITICAL",
            ProtocolStatus::High => "HIGH",
            ProtocolStatus::Medium => "MEDIUM",
            ProtocolStatus::Low => "LOW",
            ProtocolStatus::Safe => "SAFE",
        })
    }
}

impl From<Severity> for ProtocolStatus {
    fn from(level: Severity) -> Self {
        match level {
            Severity::Critical => ProtocolStatus::Critical,
            Severity::High => ProtocolStatus::High,
            Severity::Medium => ProtocolStatus::Medium,
            Severity::Low => ProtocolStatus::Low,
        }
    }
}

/// A protocol's contracts together with their aggregated assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolRisk {
    pub name: String,
    pub contracts: Vec<ContractInfo>,
    #[serde(rename = "totalTVL")]
    pub total_tvl: f64,
    pub risk_score: RiskScore,
    pub status: ProtocolStatus,
}

impl ProtocolRisk {
    /// Bundle an assessment with its contracts.
    ///
    /// Status is `Safe` when no rule matched, otherwise the score's level.
    pub fn new(contracts: Vec<ContractInfo>, risk_score: RiskScore) -> Self {
        let total_tvl = contracts.iter().map(|c| c.tvl).sum();
        let status = if risk_score.vulnerabilities.is_empty() {
            ProtocolStatus::Safe
        } else {
            risk_score.risk_level.into()
        };
        Self {
            name: risk_score.protocol.clone(),
            contracts,
            total_tvl,
            risk_score,
            status,
        }
    }
}

/// Parse an optionally `0x`-prefixed, 40 hex digit contract address.
pub fn parse_address(input: &str) -> Result<Address, ScanError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() != 40 {
        return Err(ScanError::InvalidInput(format!(
            "Invalid Ethereum address {input:?}: expected 40 hex digits, got {}",
            digits.len()
        )));
    }
    let bytes = hex::decode(digits).map_err(|e| {
        ScanError::InvalidInput(format!("Invalid Ethereum address {input:?}: {e}"))
    })?;
    Ok(Address::from_slice(&bytes))
}

/// Current wall-clock time as unix seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
