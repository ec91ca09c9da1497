//! Text output for scan results and risk assessments.

use std::fmt::Write;

use tvlscan_scanner::risk::RiskStatistics;
use tvlscan_scanner::scanner::BulkSummary;
use tvlscan_scanner::types::ProtocolRisk;
use tvlscan_scanner::{ContractInfo, RiskScore, VulnerabilityRule};

/// Compact USD amount: `$15.2M`, `$850.0K`, `$12`.
pub fn format_usd(amount: f64) -> String {
    let abs = amount.abs();
    if abs >= 1e9 {
        format!("${:.1}B", amount / 1e9)
    } else if abs >= 1e6 {
        format!("${:.1}M", amount / 1e6)
    } else if abs >= 1e3 {
        format!("${:.1}K", amount / 1e3)
    } else {
        format!("${amount:.0}")
    }
}

pub fn format_contract(info: &ContractInfo) -> String {
    format!(
        "{:<8} {}  {} {:<8} {:<24} tvl={}",
        info.risk_level,
        info.address,
        info.compiler,
        info.version,
        info.protocol,
        format_usd(info.tvl),
    )
}

pub fn format_bulk_summary(summary: &BulkSummary) -> String {
    format!(
        "Scanned {} contract(s): {} critical, {} high, {} medium, {} low",
        summary.total, summary.critical, summary.high, summary.medium, summary.low
    )
}

pub fn format_risk_score(score: &RiskScore) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: score {}/100 ({}) | TVL at risk: {}",
        score.protocol,
        score.overall_score,
        score.risk_level,
        format_usd(score.tvl_at_risk),
    );

    if !score.vulnerabilities.is_empty() {
        let _ = writeln!(out, "  Vulnerabilities:");
        for vuln in &score.vulnerabilities {
            let _ = writeln!(out, "    [{}] {}: {}", vuln.severity, vuln.id, vuln.description);
        }
    }

    let _ = writeln!(out, "  Recommendations:");
    for (i, rec) in score.recommendations.iter().enumerate() {
        let _ = write!(out, "    {}. {rec}", i + 1);
        if i + 1 < score.recommendations.len() {
            out.push('\n');
        }
    }
    out
}

pub fn format_protocol_table(protocols: &[ProtocolRisk]) -> String {
    let mut out = format!(
        "{:<24} {:>9} {:>6} {:>10} {:>12}",
        "PROTOCOL", "STATUS", "SCORE", "TVL", "AT RISK"
    );
    for p in protocols {
        let _ = write!(
            out,
            "\n{:<24} {:>9} {:>6} {:>10} {:>12}",
            p.name,
            p.status,
            p.risk_score.overall_score,
            format_usd(p.total_tvl),
            format_usd(p.risk_score.tvl_at_risk),
        );
    }
    out
}

pub fn format_statistics(stats: &RiskStatistics) -> String {
    format!(
        "Protocols: {} (critical {}, high {}, medium {}, low {}, safe {})\n\
         Total TVL: {} | At risk: {} ({:.1}%)",
        stats.total_protocols,
        stats.critical_risk,
        stats.high_risk,
        stats.medium_risk,
        stats.low_risk,
        stats.safe,
        format_usd(stats.total_tvl),
        format_usd(stats.tvl_at_risk),
        stats.risk_percentage,
    )
}

pub fn format_rules(rules: &[VulnerabilityRule]) -> String {
    let mut out = String::new();
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{:<8} {:<26} {}\n         versions: {}",
            rule.severity,
            rule.id,
            rule.description,
            rule.compiler_versions.join(", "),
        );
        if let Some(functions) = &rule.affected_functions {
            let _ = write!(out, "\n         functions: {}", functions.join(", "));
        }
    }
    out
}
