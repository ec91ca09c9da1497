//! Behavioral properties of classification and risk assessment.
//!
//! Tests:
//! - Marker-free bytecode and Vyper 0.2.15 classification
//! - Single critical match, no match, empty batch
//! - Score monotonicity and the 100 ceiling
//! - Portfolio statistics
//! - Older Solidity series: leveled per contract, not scored
//! - The 15.2M Vyper exploit scenario

use crate::catalog::LevelTable;
use crate::error::ScanError;
use crate::fingerprint::classify;
use crate::risk::recommendations::{
    CLOSING_ACTIONS, CRITICAL_ACTIONS, HIGH_TVL_ACTION, NO_VULNERABILITIES,
};
use crate::risk::statistics;
use crate::types::{CompilerFamily, ProtocolRisk, Severity, UNKNOWN_VERSION};

use super::helpers::{builtin_engine, make_contract, marked_code};

#[test]
fn test_marker_free_bytecode_is_unknown_solidity() {
    for code in ["", "0x", "0x6001600155", "not hex at all"] {
        let fp = classify(code);
        assert_eq!(fp.family, CompilerFamily::Solidity, "input {code:?}");
        assert_eq!(fp.version, UNKNOWN_VERSION, "input {code:?}");
    }
}

#[test]
fn test_vyper_marker_with_0_2_15() {
    let fp = classify(&marked_code("00000.2.15"));
    assert_eq!(fp.family, CompilerFamily::Vyper);
    assert_eq!(fp.version, "0.2.15");
}

#[test]
fn test_single_critical_match_puts_whole_batch_at_risk() {
    let batch = vec![
        make_contract("P", "0.2.15", 2e6),
        make_contract("P", "0.8.19", 3e6),
    ];
    let score = builtin_engine().assess(&batch).expect("assess");
    assert_eq!(score.overall_score, 40);
    assert_eq!(score.vulnerabilities.len(), 1);
    assert!((score.tvl_at_risk - 5e6).abs() < 1e-6);
}

#[test]
fn test_no_matches_is_low_with_single_recommendation() {
    let batch = vec![make_contract("P", "0.8.19", 50e6)];
    let score = builtin_engine().assess(&batch).expect("assess");
    assert_eq!(score.overall_score, 0);
    assert_eq!(score.risk_level, Severity::Low);
    assert_eq!(score.tvl_at_risk, 0.0);
    assert_eq!(score.recommendations, vec![NO_VULNERABILITIES.to_string()]);
}

#[test]
fn test_unknown_version_never_matches() {
    let batch = vec![make_contract("P", UNKNOWN_VERSION, 1e6)];
    let score = builtin_engine().assess(&batch).expect("assess");
    assert!(score.vulnerabilities.is_empty());
}

#[test]
fn test_empty_batch_is_invalid_input() {
    let err = builtin_engine().assess(&[]).expect_err("empty batch");
    assert!(matches!(err, ScanError::InvalidInput(_)));
    assert!(!err.is_transient());
}

#[test]
fn test_score_is_monotone_and_bounded() {
    let engine = builtin_engine();
    let versions = ["0.8.0", "0.7.3", "0.8.1", "0.3.0", "0.2.16", "0.2.15", "0.6.12"];

    let mut batch = Vec::new();
    let mut previous = 0;
    for version in versions {
        batch.push(make_contract("P", version, 1e6));
        let score = engine.assess(&batch).expect("assess").overall_score;
        assert!(score >= previous, "score dropped from {previous} to {score}");
        assert!(score <= 100);
        previous = score;
    }
    assert_eq!(previous, 100);
}

#[test]
fn test_level_follows_score_thresholds() {
    let engine = builtin_engine();
    // 25 + 25 + 15 = 65
    let batch = vec![
        make_contract("P", "0.3.0", 1.0),
        make_contract("P", "0.3.0", 1.0),
        make_contract("P", "0.8.2", 1.0),
    ];
    let score = engine.assess(&batch).expect("assess");
    assert_eq!(score.overall_score, 65);
    assert_eq!(score.risk_level, Severity::High);
}

#[test]
fn test_statistics_over_assessed_portfolio() {
    let engine = builtin_engine();
    let batches = [
        vec![make_contract("Curve", "0.2.15", 30e6)],
        vec![make_contract("Yearn", "0.3.0", 40e6)],
        vec![make_contract("Aave", "0.8.19", 30e6)],
    ];
    let protocols: Vec<ProtocolRisk> = batches
        .into_iter()
        .map(|batch| {
            let score = engine.assess(&batch).expect("assess");
            ProtocolRisk::new(batch, score)
        })
        .collect();

    let stats = statistics(&protocols);
    assert_eq!(stats.total_protocols, 3);
    // A lone critical match scores 40, which is only MEDIUM overall.
    assert_eq!(stats.critical_risk, 0);
    assert_eq!(stats.medium_risk, 1);
    assert_eq!(stats.low_risk, 1);
    assert_eq!(stats.safe, 1);
    // 30M (critical) + 40M * 0.75
    assert!((stats.tvl_at_risk - 60e6).abs() < 1e-3);
    assert!((stats.risk_percentage - 60.0).abs() < 1e-9);
}

#[test]
fn test_older_solidity_is_leveled_but_not_scored() {
    let mut contract = make_contract("Yearn Finance", "0.7.3", 20e6);
    let levels = LevelTable::builtin();
    contract.risk_level = levels.level(contract.compiler, &contract.version);
    assert_eq!(contract.risk_level, Severity::High);

    let score = builtin_engine().assess(&[contract]).expect("assess");
    assert_eq!(score.overall_score, 0);
    assert_eq!(score.risk_level, Severity::Low);
    assert_eq!(score.tvl_at_risk, 0.0);
    assert_eq!(score.recommendations, vec![NO_VULNERABILITIES.to_string()]);
}

#[test]
fn test_vyper_exploit_scenario() {
    let contract = make_contract("Vulnerable Protocol 1", "0.2.15", 15.2e6);
    let score = builtin_engine().assess(&[contract]).expect("assess");

    assert_eq!(score.protocol, "Vulnerable Protocol 1");
    assert_eq!(score.overall_score, 40);
    assert_eq!(score.risk_level, Severity::Medium);
    assert!((score.tvl_at_risk - 15.2e6).abs() < 1e-6);

    let expected: Vec<String> = CRITICAL_ACTIONS
        .iter()
        .chain(std::iter::once(&HIGH_TVL_ACTION))
        .chain(CLOSING_ACTIONS.iter())
        .map(|s| s.to_string())
        .collect();
    assert_eq!(score.recommendations, expected);
}
