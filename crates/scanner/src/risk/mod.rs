//! Risk scoring engine.
//!
//! Maps each contract's compiler version to catalog rules, sums severity
//! weights into a 0-100 score, estimates the TVL exposed and attaches
//! recommendations.

pub mod portfolio;
pub mod recommendations;

use std::sync::Arc;

use crate::catalog::{RuleCatalog, matching_rules};
use crate::error::ScanError;
use crate::types::{
    ContractInfo, ProtocolRisk, RiskScore, Severity, VulnerabilityRule, now_unix_secs,
};

pub use portfolio::{RiskStatistics, group_by_protocol, statistics, total_tvl_at_risk};
pub use recommendations::HIGH_TVL_THRESHOLD_USD;

/// Upper bound of [`RiskScore::overall_score`].
pub const MAX_SCORE: u32 = 100;

/// Share of a contract's TVL exposed per severity rank.
pub const EXPOSURE_PER_RANK: f64 = 0.25;

/// Scores batches of contracts against an injected rule catalog.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    catalog: Arc<RuleCatalog>,
    high_tvl_threshold: f64,
}

impl RiskEngine {
    pub fn new(catalog: Arc<RuleCatalog>) -> Self {
        Self {
            catalog,
            high_tvl_threshold: HIGH_TVL_THRESHOLD_USD,
        }
    }

    /// Override the aggregate TVL that triggers the high-TVL recommendation.
    pub fn with_high_tvl_threshold(mut self, threshold_usd: f64) -> Self {
        self.high_tvl_threshold = threshold_usd;
        self
    }

    pub fn catalog(&self) -> &Arc<RuleCatalog> {
        &self.catalog
    }

    /// Assess a batch of contracts belonging to one protocol.
    ///
    /// The protocol name is taken from the first contract. Fails with
    /// [`ScanError::InvalidInput`] on an empty batch.
    pub fn assess(&self, contracts: &[ContractInfo]) -> Result<RiskScore, ScanError> {
        let first = contracts.first().ok_or_else(|| {
            ScanError::InvalidInput("No contracts provided for risk assessment".to_string())
        })?;

        // One snapshot per call so a concurrent add_rule cannot split a batch.
        let rules = self.catalog.list_rules();
        let per_contract: Vec<Vec<VulnerabilityRule>> = contracts
            .iter()
            .map(|contract| matching_rules(&rules, &contract.version))
            .collect();

        let overall_score = score(&per_contract);
        let risk_level = Severity::from_score(overall_score);
        let tvl_at_risk = tvl_at_risk(contracts, &per_contract);
        let total_tvl: f64 = contracts.iter().map(|c| c.tvl).sum();

        let vulnerabilities: Vec<VulnerabilityRule> = per_contract.into_iter().flatten().collect();
        let recommendations =
            recommendations::generate(&vulnerabilities, total_tvl, self.high_tvl_threshold);

        tracing::debug!(
            protocol = %first.protocol,
            contracts = contracts.len(),
            matches = vulnerabilities.len(),
            score = overall_score,
            level = %risk_level,
            "Assessed protocol risk"
        );

        Ok(RiskScore {
            protocol: first.protocol.clone(),
            overall_score,
            risk_level,
            vulnerabilities,
            tvl_at_risk,
            last_updated: now_unix_secs(),
            recommendations,
        })
    }

    /// Assess every protocol present in `contracts`, in first-seen order.
    pub fn assess_portfolio(
        &self,
        contracts: &[ContractInfo],
    ) -> Result<Vec<ProtocolRisk>, ScanError> {
        group_by_protocol(contracts)
            .into_iter()
            .map(|(_, group)| {
                let score = self.assess(&group)?;
                Ok(ProtocolRisk::new(group, score))
            })
            .collect()
    }
}

/// Sum of severity weights over every match, clamped to [`MAX_SCORE`].
fn score(per_contract: &[Vec<VulnerabilityRule>]) -> u32 {
    per_contract
        .iter()
        .flatten()
        .map(|rule| rule.severity.score_weight())
        .fold(0u32, u32::saturating_add)
        .min(MAX_SCORE)
}

/// Full batch TVL when any match is critical, otherwise a per-contract
/// fraction of TVL proportional to the contract's worst match.
fn tvl_at_risk(contracts: &[ContractInfo], per_contract: &[Vec<VulnerabilityRule>]) -> f64 {
    let any_critical = per_contract
        .iter()
        .flatten()
        .any(|rule| rule.severity == Severity::Critical);

    if any_critical {
        return contracts.iter().map(|c| c.tvl).sum();
    }

    contracts
        .iter()
        .zip(per_contract)
        .map(|(contract, matches)| {
            let max_rank = matches
                .iter()
                .map(|rule| rule.severity.rank())
                .max()
                .unwrap_or(0);
            contract.tvl * (f64::from(max_rank) * EXPOSURE_PER_RANK)
        })
        .sum()
}
