//! Shared fixtures for scanner tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::catalog::RuleCatalog;
use crate::error::SourceError;
use crate::risk::RiskEngine;
use crate::source::BytecodeSource;
use crate::types::{CompilerFamily, ContractInfo, Severity};

/// Marker shared by both compiler families.
pub const MARKER: &str = "608060405234801561001057600080fd5b506101";

pub const ADDR_A: &str = "0x1234567890123456789012345678901234567890";
pub const ADDR_B: &str = "0x2345678901234567890123456789012345678901";
pub const ADDR_C: &str = "0x3456789012345678901234567890123456789012";

/// Hex bytecode carrying the family marker followed by `tail`.
pub fn marked_code(tail: &str) -> String {
    format!("0x{MARKER}{tail}")
}

pub fn builtin_engine() -> RiskEngine {
    RiskEngine::new(Arc::new(RuleCatalog::builtin()))
}

pub fn make_contract(protocol: &str, version: &str, tvl: f64) -> ContractInfo {
    ContractInfo {
        address: ADDR_A.to_string(),
        compiler: if version.starts_with("0.2") || version.starts_with("0.3") {
            CompilerFamily::Vyper
        } else {
            CompilerFamily::Solidity
        },
        version: version.to_string(),
        protocol: protocol.to_string(),
        tvl,
        risk_level: Severity::Low,
        chain: "ethereum".to_string(),
        last_scanned: 0,
    }
}

/// Bytecode source that answers with fixed code until switched off.
pub struct SwitchableSource {
    code: String,
    down: AtomicBool,
}

impl SwitchableSource {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            down: AtomicBool::new(false),
        }
    }

    pub fn take_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }
}

impl BytecodeSource for SwitchableSource {
    fn get_code(&self, _address: &str) -> Result<String, SourceError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SourceError::unavailable("node", "503 Service Unavailable"));
        }
        Ok(self.code.clone())
    }
}
