//! Error types for scanning and risk assessment.

/// Errors surfaced by the scanner and the risk engine.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Structurally invalid input: empty assessment batch, malformed address.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A bytecode or TVL lookup failed and no cached result could stand in.
    #[error("Failed to scan contract {address}: {source}")]
    TransientSourceFailure {
        address: String,
        #[source]
        source: SourceError,
    },
}

impl ScanError {
    /// Whether the caller may reasonably retry the operation later.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScanError::TransientSourceFailure { .. })
    }
}

/// Failure reported by an external bytecode or TVL source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// JSON-RPC transport or protocol failure, retries already exhausted.
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("{source_name} unavailable: {cause}")]
    Unavailable { source_name: String, cause: String },
}

impl SourceError {
    pub fn unavailable(source_name: impl Into<String>, cause: impl Into<String>) -> Self {
        SourceError::Unavailable {
            source_name: source_name.into(),
            cause: cause.into(),
        }
    }
}
