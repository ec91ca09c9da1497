//! Compiler fingerprint classifier.
//!
//! Best-effort heuristic over the hex text of deployed bytecode: the compiler
//! family is chosen by marker containment and the version by the first known
//! version literal found, in a fixed per-family priority order.
//!
//! The marker tables are identical for both families, so any contract that
//! carries the marker classifies as Vyper. Version literals contain dots and
//! therefore never occur in real hex bytecode; results are advisory only.
//! Reliable detection needs the CBOR metadata trailer, which this module does
//! not parse.

use serde::Serialize;

use crate::types::{CompilerFamily, UNKNOWN_VERSION};

/// Bytecode markers that select the Vyper family.
pub const VYPER_MARKERS: [&str; 3] = [
    "608060405234801561001057600080fd5b506101",
    "608060405234801561001057600080fd5b506101",
    "608060405234801561001057600080fd5b506101",
];

/// Bytecode markers that select the Solidity family.
pub const SOLIDITY_MARKERS: [&str; 2] = [
    "608060405234801561001057600080fd5b506101",
    "608060405234801561001057600080fd5b506101",
];

/// Vyper version literals in priority order: (literal searched, version reported).
const VYPER_VERSIONS: [(&str, &str); 12] = [
    ("0.2.15", "0.2.15"),
    ("0.2.16", "0.2.15"),
    ("0.3.0", "0.3.0"),
    ("0.3.1", "0.3.1"),
    ("0.3.2", "0.3.2"),
    ("0.3.3", "0.3.3"),
    ("0.3.4", "0.3.4"),
    ("0.3.5", "0.3.5"),
    ("0.3.6", "0.3.6"),
    ("0.3.7", "0.3.7"),
    ("0.3.8", "0.3.8"),
    ("0.3.9", "0.3.9"),
];

/// Solidity `major.minor` pairs are searched first, over these ranges.
const SOLIDITY_MAX_MAJOR: u32 = 8;
const SOLIDITY_MAX_MINOR: u32 = 25;

/// Solidity full versions searched after the pairs, newest first.
const SOLIDITY_KNOWN_VERSIONS: [&str; 46] = [
    "0.8.25", "0.8.24", "0.8.23", "0.8.22", "0.8.21", "0.8.20", "0.8.19", "0.8.18", "0.8.17",
    "0.8.16", "0.8.15", "0.8.14", "0.8.13", "0.8.12", "0.8.11", "0.8.10", "0.8.9", "0.8.8",
    "0.8.7", "0.8.6", "0.8.5", "0.8.4", "0.8.3", "0.8.2", "0.8.1", "0.8.0", "0.7.6", "0.7.5",
    "0.7.4", "0.7.3", "0.7.2", "0.7.1", "0.7.0", "0.6.12", "0.6.11", "0.6.10", "0.6.9", "0.6.8",
    "0.6.7", "0.6.6", "0.6.5", "0.6.4", "0.6.3", "0.6.2", "0.6.1", "0.6.0",
];

/// Compiler family and version inferred from bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerFingerprint {
    pub family: CompilerFamily,
    pub version: String,
}

impl CompilerFingerprint {
    fn unknown(family: CompilerFamily) -> Self {
        Self {
            family,
            version: UNKNOWN_VERSION.to_string(),
        }
    }
}

/// Classify `0x`-prefixed (or bare) hex bytecode.
///
/// Never fails: empty, malformed or unrecognized input yields
/// `(Solidity, "unknown")`.
pub fn classify(bytecode_hex: &str) -> CompilerFingerprint {
    let code = bytecode_hex.strip_prefix("0x").unwrap_or(bytecode_hex);

    if is_vyper(code) {
        return CompilerFingerprint {
            family: CompilerFamily::Vyper,
            version: extract_vyper_version(code),
        };
    }

    if is_solidity(code) {
        return CompilerFingerprint {
            family: CompilerFamily::Solidity,
            version: extract_solidity_version(code),
        };
    }

    CompilerFingerprint::unknown(CompilerFamily::Solidity)
}

fn is_vyper(code: &str) -> bool {
    VYPER_MARKERS.iter().any(|marker| code.contains(marker))
}

fn is_solidity(code: &str) -> bool {
    SOLIDITY_MARKERS.iter().any(|marker| code.contains(marker))
}

fn extract_vyper_version(code: &str) -> String {
    VYPER_VERSIONS
        .iter()
        .find(|(literal, _)| code.contains(literal))
        .map(|(_, version)| version.to_string())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}

fn extract_solidity_version(code: &str) -> String {
    let pair = (0..=SOLIDITY_MAX_MAJOR)
        .flat_map(|major| (0..=SOLIDITY_MAX_MINOR).map(move |minor| format!("{major}.{minor}")))
        .find(|pair| code.contains(pair.as_str()));
    if let Some(pair) = pair {
        return pair;
    }

    SOLIDITY_KNOWN_VERSIONS
        .iter()
        .find(|version| code.contains(*version))
        .map(|version| version.to_string())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}
