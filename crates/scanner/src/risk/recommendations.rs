//! Advisory text attached to a risk assessment.

use crate::types::{Severity, VulnerabilityRule};

pub const NO_VULNERABILITIES: &str = "No immediate vulnerabilities detected. Continue monitoring.";

pub const CRITICAL_ACTIONS: [&str; 4] = [
    "IMMEDIATE ACTION REQUIRED: Critical vulnerabilities detected",
    "Consider emergency pause of affected contracts",
    "Deploy white hat bots to protect funds",
    "Contact protocol team immediately",
];

pub const HIGH_ACTIONS: [&str; 3] = [
    "HIGH PRIORITY: High severity vulnerabilities found",
    "Schedule urgent contract upgrades",
    "Increase monitoring frequency",
];

pub const HIGH_TVL_ACTION: &str = "High TVL at risk - prioritize mitigation";

pub const CLOSING_ACTIONS: [&str; 2] = [
    "Implement continuous monitoring and alerting",
    "Consider insurance coverage for remaining risks",
];

/// Aggregate TVL above which the high-TVL line is added (USD 10M).
pub const HIGH_TVL_THRESHOLD_USD: f64 = 10_000_000.0;

/// Ordered recommendations for the matched rules of a batch.
pub fn generate(
    vulnerabilities: &[VulnerabilityRule],
    total_tvl: f64,
    high_tvl_threshold: f64,
) -> Vec<String> {
    if vulnerabilities.is_empty() {
        return vec![NO_VULNERABILITIES.to_string()];
    }

    let has = |severity: Severity| vulnerabilities.iter().any(|v| v.severity == severity);
    let mut out = Vec::new();

    if has(Severity::Critical) {
        out.extend(CRITICAL_ACTIONS.iter().map(|s| s.to_string()));
    }
    if has(Severity::High) {
        out.extend(HIGH_ACTIONS.iter().map(|s| s.to_string()));
    }
    if total_tvl > high_tvl_threshold {
        out.push(HIGH_TVL_ACTION.to_string());
    }
    out.extend(CLOSING_ACTIONS.iter().map(|s| s.to_string()));

    out
}
