//! Vulnerability rule catalog.
//!
//! [`RuleCatalog`] is the explicit, append-only table the risk engine scores
//! against. Reads take a snapshot under a read lock;
//! [`RuleCatalog::add_rule`] is the only writer. [`LevelTable`] is the fixed
//! per-family table the scanner uses to level individual contracts.

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use crate::types::{CompilerFamily, Severity, VulnerabilityRule};

/// Append-only, thread-safe vulnerability catalog.
#[derive(Debug, Default)]
pub struct RuleCatalog {
    rules: RwLock<Vec<VulnerabilityRule>>,
}

impl RuleCatalog {
    /// Catalog seeded with the built-in compiler advisories.
    pub fn builtin() -> Self {
        Self::with_rules(builtin_rules())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<VulnerabilityRule>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Snapshot of every rule, in registration order.
    pub fn list_rules(&self) -> Vec<VulnerabilityRule> {
        self.read().clone()
    }

    /// Append a rule. Ids are not checked for uniqueness; duplicates all match.
    pub fn add_rule(&self, rule: VulnerabilityRule) {
        tracing::debug!(
            rule_id = %rule.id,
            severity = %rule.severity,
            "Registering vulnerability rule"
        );
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rule);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Every rule whose version set contains `version`, in catalog order.
    ///
    /// Compiler family is not consulted: versions are treated as unique
    /// across families.
    pub fn matching(&self, version: &str) -> Vec<VulnerabilityRule> {
        matching_rules(&self.read(), version)
    }

    // The guarded Vec is only ever appended to, so a poisoned lock still
    // holds a consistent table.
    fn read(&self) -> RwLockReadGuard<'_, Vec<VulnerabilityRule>> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Rules from `rules` that apply to `version`, in order.
pub(crate) fn matching_rules(rules: &[VulnerabilityRule], version: &str) -> Vec<VulnerabilityRule> {
    rules
        .iter()
        .filter(|rule| rule.applies_to(version))
        .cloned()
        .collect()
}

/// Advisories the risk engine scores against.
pub fn builtin_rules() -> Vec<VulnerabilityRule> {
    vec![
        VulnerabilityRule::new(
            "vyper-0.2.15-reentrancy",
            &["0.2.15", "0.2.16"],
            Severity::Critical,
            "Vyper 0.2.15/0.2.16 reentrancy vulnerability (Curve Finance exploit)",
        ),
        VulnerabilityRule::new(
            "vyper-0.3.0-issues",
            &["0.3.0"],
            Severity::High,
            "Vyper 0.3.0 known issues",
        ),
        VulnerabilityRule::new(
            "solidity-reentrancy",
            &["0.8.0", "0.8.1", "0.8.2"],
            Severity::Medium,
            "Potential reentrancy vulnerabilities in older Solidity versions",
        ),
    ]
}

/// Per-family advisories that set the risk level of a freshly scanned
/// contract.
///
/// Separate from [`RuleCatalog`]: it covers older Solidity series the
/// assessment catalog does not score, and rules registered at runtime
/// never change it.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTable {
    vyper: Vec<VulnerabilityRule>,
    solidity: Vec<VulnerabilityRule>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LevelTable {
    pub fn builtin() -> Self {
        Self {
            vyper: vec![
                VulnerabilityRule::new(
                    "vyper-0.2.15-reentrancy",
                    &["0.2.15", "0.2.16"],
                    Severity::Critical,
                    "Vyper 0.2.15/0.2.16 reentrancy vulnerability (Curve Finance exploit)",
                ),
                VulnerabilityRule::new(
                    "vyper-0.3.0-issues",
                    &["0.3.0"],
                    Severity::High,
                    "Vyper 0.3.0 known issues",
                ),
            ],
            solidity: vec![
                VulnerabilityRule::new(
                    "solidity-0.8.0-reentrancy",
                    &["0.8.0", "0.8.1", "0.8.2"],
                    Severity::Medium,
                    "Potential reentrancy vulnerabilities in older Solidity versions",
                ),
                VulnerabilityRule::new(
                    "solidity-0.7.0-issues",
                    &["0.7.0", "0.7.1", "0.7.2", "0.7.3", "0.7.4", "0.7.5", "0.7.6"],
                    Severity::High,
                    "Multiple vulnerabilities in Solidity 0.7.x series",
                ),
                VulnerabilityRule::new(
                    "solidity-0.6.0-issues",
                    &[
                        "0.6.0", "0.6.1", "0.6.2", "0.6.3", "0.6.4", "0.6.5", "0.6.6", "0.6.7",
                        "0.6.8", "0.6.9", "0.6.10", "0.6.11", "0.6.12",
                    ],
                    Severity::High,
                    "Critical vulnerabilities in Solidity 0.6.x series",
                ),
            ],
        }
    }

    pub fn new(vyper: Vec<VulnerabilityRule>, solidity: Vec<VulnerabilityRule>) -> Self {
        Self { vyper, solidity }
    }

    /// Rules for `family`, in lookup order.
    pub fn rules_for(&self, family: CompilerFamily) -> &[VulnerabilityRule] {
        match family {
            CompilerFamily::Vyper => &self.vyper,
            CompilerFamily::Solidity => &self.solidity,
        }
    }

    /// Vyper rules followed by Solidity rules.
    pub fn rules(&self) -> Vec<VulnerabilityRule> {
        self.vyper.iter().chain(&self.solidity).cloned().collect()
    }

    /// Severity of the first `family` rule listing `version`, or LOW.
    pub fn level(&self, family: CompilerFamily, version: &str) -> Severity {
        self.rules_for(family)
            .iter()
            .find(|rule| rule.applies_to(version))
            .map_or(Severity::Low, |rule| rule.severity)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn builtin_catalog_contents() {
        let catalog = RuleCatalog::builtin();
        let ids: Vec<String> = catalog.list_rules().into_iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![
                "vyper-0.2.15-reentrancy",
                "vyper-0.3.0-issues",
                "solidity-reentrancy",
            ]
        );
    }

    #[test]
    fn matching_by_version() {
        let catalog = RuleCatalog::builtin();
        let matches = catalog.matching("0.2.16");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].severity, Severity::Critical);

        assert!(catalog.matching("0.8.19").is_empty());
        assert!(catalog.matching("unknown").is_empty());
    }

    #[test]
    fn older_solidity_series_are_not_scored() {
        let catalog = RuleCatalog::builtin();
        assert!(catalog.matching("0.7.3").is_empty());
        assert!(catalog.matching("0.6.12").is_empty());
    }

    #[test]
    fn level_table_is_looked_up_by_family() {
        let levels = LevelTable::builtin();
        assert_eq!(levels.level(CompilerFamily::Solidity, "0.7.3"), Severity::High);
        assert_eq!(levels.level(CompilerFamily::Solidity, "0.6.12"), Severity::High);
        assert_eq!(levels.level(CompilerFamily::Solidity, "0.8.1"), Severity::Medium);
        assert_eq!(levels.level(CompilerFamily::Vyper, "0.2.16"), Severity::Critical);
        assert_eq!(levels.level(CompilerFamily::Vyper, "0.3.0"), Severity::High);
        // Versions only count within their own family's table.
        assert_eq!(levels.level(CompilerFamily::Vyper, "0.7.3"), Severity::Low);
        assert_eq!(levels.level(CompilerFamily::Solidity, "0.2.15"), Severity::Low);
        assert_eq!(levels.level(CompilerFamily::Solidity, "unknown"), Severity::Low);
    }

    #[test]
    fn level_table_uses_first_match() {
        let levels = LevelTable::new(
            vec![],
            vec![
                VulnerabilityRule::new("a", &["0.8.1"], Severity::Low, "a"),
                VulnerabilityRule::new("b", &["0.8.1"], Severity::Critical, "b"),
            ],
        );
        assert_eq!(levels.level(CompilerFamily::Solidity, "0.8.1"), Severity::Low);
    }

    #[test]
    fn level_table_lists_vyper_then_solidity() {
        let levels = LevelTable::builtin();
        let ids: Vec<String> = levels.rules().into_iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![
                "vyper-0.2.15-reentrancy",
                "vyper-0.3.0-issues",
                "solidity-0.8.0-reentrancy",
                "solidity-0.7.0-issues",
                "solidity-0.6.0-issues",
            ]
        );
    }

    #[test]
    fn add_rule_appends_without_uniqueness_check() {
        let catalog = RuleCatalog::builtin();
        let before = catalog.len();
        let dup = VulnerabilityRule::new(
            "vyper-0.2.15-reentrancy",
            &["0.2.15"],
            Severity::High,
            "duplicate id",
        );
        catalog.add_rule(dup.clone());
        assert_eq!(catalog.len(), before + 1);

        let matches = catalog.matching("0.2.15");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1], dup);
    }

    #[test]
    fn list_rules_is_a_snapshot() {
        let catalog = RuleCatalog::empty();
        assert!(catalog.is_empty());
        let snapshot = catalog.list_rules();
        catalog.add_rule(VulnerabilityRule::new("r", &["1.0.0"], Severity::Low, "r"));
        assert!(snapshot.is_empty());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let catalog = Arc::new(RuleCatalog::builtin());
        let writer = {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                for i in 0..50 {
                    catalog.add_rule(VulnerabilityRule::new(
                        format!("extra-{i}"),
                        &["9.9.9"],
                        Severity::Low,
                        "extra",
                    ));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                thread::spawn(move || {
                    for _ in 0..50 {
                        assert_eq!(catalog.matching("0.2.15").len(), 1);
                    }
                })
            })
            .collect();
        writer.join().expect("writer");
        for r in readers {
            r.join().expect("reader");
        }
        assert_eq!(catalog.matching("9.9.9").len(), 50);
    }
}
