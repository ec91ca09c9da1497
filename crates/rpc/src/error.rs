use tvlscan_scanner::SourceError;

/// Structured RPC error types for programmatic handling.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("Connection to {url} failed: {cause}")]
    ConnectionFailed { url: String, cause: String },

    #[error("{method} timed out after {elapsed_ms}ms")]
    Timeout { method: String, elapsed_ms: u64 },

    #[error("{method} HTTP {status}: {body}")]
    HttpError {
        method: String,
        status: u16,
        body: String,
    },

    #[error("{method} JSON-RPC error {code}: {message}")]
    JsonRpcError {
        method: String,
        code: i64,
        message: String,
    },

    #[error("{method} response parse error in {field}: {cause}")]
    ParseError {
        method: String,
        field: String,
        cause: String,
    },

    #[error("{method} failed after {attempts} attempt(s): {last_error}")]
    RetryExhausted {
        method: String,
        attempts: u32,
        last_error: Box<RpcError>,
    },

    #[error("Invalid address {0:?}")]
    InvalidAddress(String),
}

impl RpcError {
    /// Whether this error is likely transient and retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::ConnectionFailed { .. } | RpcError::Timeout { .. } => true,
            // 429 = rate limited, 502/503/504 = upstream trouble
            RpcError::HttpError { status, .. } => matches!(*status, 429 | 502 | 503 | 504),
            RpcError::JsonRpcError { .. }
            | RpcError::ParseError { .. }
            | RpcError::RetryExhausted { .. }
            | RpcError::InvalidAddress(_) => false,
        }
    }

    /// Retry-After hint of an HTTP 429, in seconds.
    pub fn retry_after_secs(&self) -> Option<u64> {
        // The header value is carried in `body` as `retry-after:<secs>`.
        if let RpcError::HttpError {
            status: 429, body, ..
        } = self
        {
            body.strip_prefix("retry-after:")
                .and_then(|s| s.trim().parse().ok())
        } else {
            None
        }
    }

    pub(crate) fn parse(method: &str, field: &str, cause: impl Into<String>) -> Self {
        RpcError::ParseError {
            method: method.into(),
            field: field.into(),
            cause: cause.into(),
        }
    }
}

impl From<RpcError> for SourceError {
    fn from(e: RpcError) -> Self {
        SourceError::Rpc(e.to_string())
    }
}
