//! Portfolio-level aggregation over assessed protocols.

use serde::Serialize;

use crate::types::{ContractInfo, ProtocolRisk, ProtocolStatus};

/// Dashboard statistics for a set of assessed protocols.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskStatistics {
    pub total_protocols: usize,
    pub critical_risk: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub safe: usize,
    #[serde(rename = "totalTVL")]
    pub total_tvl: f64,
    pub tvl_at_risk: f64,
    /// `tvl_at_risk / total_tvl * 100`, or 0 when there is no TVL.
    pub risk_percentage: f64,
}

/// Split contracts into per-protocol batches, keeping first-seen order.
pub fn group_by_protocol(contracts: &[ContractInfo]) -> Vec<(String, Vec<ContractInfo>)> {
    let mut groups: Vec<(String, Vec<ContractInfo>)> = Vec::new();
    for contract in contracts {
        match groups.iter_mut().find(|(name, _)| *name == contract.protocol) {
            Some((_, group)) => group.push(contract.clone()),
            None => groups.push((contract.protocol.clone(), vec![contract.clone()])),
        }
    }
    groups
}

/// Sum of every protocol's TVL-at-risk.
pub fn total_tvl_at_risk(protocols: &[ProtocolRisk]) -> f64 {
    protocols.iter().map(|p| p.risk_score.tvl_at_risk).sum()
}

pub fn statistics(protocols: &[ProtocolRisk]) -> RiskStatistics {
    let count = |status: ProtocolStatus| protocols.iter().filter(|p| p.status == status).count();

    let total_tvl: f64 = protocols.iter().map(|p| p.total_tvl).sum();
    let tvl_at_risk = total_tvl_at_risk(protocols);
    let risk_percentage = if total_tvl > 0.0 {
        tvl_at_risk / total_tvl * 100.0
    } else {
        0.0
    };

    RiskStatistics {
        total_protocols: protocols.len(),
        critical_risk: count(ProtocolStatus::Critical),
        high_risk: count(ProtocolStatus::High),
        medium_risk: count(ProtocolStatus::Medium),
        low_risk: count(ProtocolStatus::Low),
        safe: count(ProtocolStatus::Safe),
        total_tvl,
        tvl_at_risk,
        risk_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompilerFamily, RiskScore, Severity};

    fn protocol(name: &str, status: ProtocolStatus, total_tvl: f64, at_risk: f64) -> ProtocolRisk {
        ProtocolRisk {
            name: name.to_string(),
            contracts: vec![],
            total_tvl,
            risk_score: RiskScore {
                protocol: name.to_string(),
                overall_score: 0,
                risk_level: Severity::Low,
                vulnerabilities: vec![],
                tvl_at_risk: at_risk,
                last_updated: 0,
                recommendations: vec![],
            },
            status,
        }
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let contract = |protocol: &str| ContractInfo {
            address: "0x0000000000000000000000000000000000000001".into(),
            compiler: CompilerFamily::Solidity,
            version: "0.8.19".into(),
            protocol: protocol.into(),
            tvl: 1.0,
            risk_level: Severity::Low,
            chain: "ethereum".into(),
            last_scanned: 0,
        };
        let groups = group_by_protocol(&[contract("B"), contract("A"), contract("B")]);
        let summary: Vec<(&str, usize)> = groups
            .iter()
            .map(|(name, group)| (name.as_str(), group.len()))
            .collect();
        assert_eq!(summary, vec![("B", 2), ("A", 1)]);
    }

    #[test]
    fn empty_portfolio() {
        let stats = statistics(&[]);
        assert_eq!(stats.total_protocols, 0);
        assert_eq!(stats.total_tvl, 0.0);
        assert_eq!(stats.risk_percentage, 0.0);
        assert_eq!(total_tvl_at_risk(&[]), 0.0);
    }

    #[test]
    fn zero_tvl_gives_zero_percentage() {
        let stats = statistics(&[protocol("A", ProtocolStatus::High, 0.0, 0.0)]);
        assert_eq!(stats.risk_percentage, 0.0);
        assert_eq!(stats.high_risk, 1);
    }

    #[test]
    fn buckets_and_percentage() {
        let protocols = vec![
            protocol("A", ProtocolStatus::Critical, 40.0, 40.0),
            protocol("B", ProtocolStatus::High, 30.0, 10.0),
            protocol("C", ProtocolStatus::Medium, 20.0, 0.0),
            protocol("D", ProtocolStatus::Low, 5.0, 0.0),
            protocol("E", ProtocolStatus::Safe, 5.0, 0.0),
        ];
        let stats = statistics(&protocols);
        assert_eq!(stats.total_protocols, 5);
        assert_eq!(
            (
                stats.critical_risk,
                stats.high_risk,
                stats.medium_risk,
                stats.low_risk,
                stats.safe
            ),
            (1, 1, 1, 1, 1)
        );
        assert_eq!(stats.total_tvl, 100.0);
        assert_eq!(stats.tvl_at_risk, 50.0);
        assert!((stats.risk_percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(total_tvl_at_risk(&protocols), 50.0);
    }
}
