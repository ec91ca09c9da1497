//! Thin JSON-RPC HTTP client for Ethereum nodes.
//!
//! Supports configurable timeouts, exponential backoff retry, and
//! rate-limit awareness (HTTP 429 + Retry-After).

use std::time::Duration;

use ethereum_types::Address;
use serde_json::{Value, json};
use tvlscan_scanner::config::RpcTomlConfig;
use tvlscan_scanner::source::BytecodeSource;
use tvlscan_scanner::types::parse_address;
use tvlscan_scanner::SourceError;

use crate::error::RpcError;

/// Block tag used when none is pinned.
pub const LATEST: &str = "latest";

/// Configuration for RPC client behavior.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Per-request timeout (default: 30s).
    pub timeout: Duration,
    /// TCP connect timeout (default: 10s).
    pub connect_timeout: Duration,
    /// Maximum retry attempts for transient errors (default: 3).
    pub max_retries: u32,
    /// Base backoff duration, doubled each retry (default: 1s).
    pub base_backoff: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        RpcConfig::from(&RpcTomlConfig::default())
    }
}

impl From<&RpcTomlConfig> for RpcConfig {
    fn from(toml: &RpcTomlConfig) -> Self {
        Self {
            timeout: Duration::from_secs(toml.timeout_secs),
            connect_timeout: Duration::from_secs(toml.connect_timeout_secs),
            max_retries: toml.max_retries,
            base_backoff: Duration::from_millis(toml.base_backoff_ms),
        }
    }
}

/// Minimal Ethereum JSON-RPC client using blocking HTTP.
pub struct EthRpcClient {
    http: reqwest::blocking::Client,
    url: String,
    block_tag: String,
    config: RpcConfig,
}

impl EthRpcClient {
    pub fn new(url: &str) -> Self {
        Self::with_config(url, RpcConfig::default())
    }

    pub fn with_config(url: &str, config: RpcConfig) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            http,
            url: url.to_string(),
            block_tag: LATEST.to_string(),
            config,
        }
    }

    /// Read code at a fixed block instead of `latest`.
    pub fn at_block(mut self, block_number: u64) -> Self {
        self.block_tag = format!("0x{block_number:x}");
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn block_tag(&self) -> &str {
        &self.block_tag
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Deployed bytecode at `addr`; empty for accounts without code.
    pub fn eth_get_code(&self, addr: Address) -> Result<Vec<u8>, RpcError> {
        let result = self.rpc_call(
            "eth_getCode",
            json!([format!("0x{addr:x}"), &self.block_tag]),
        )?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| RpcError::parse("eth_getCode", "result", "expected string"))?;
        hex_decode("eth_getCode", hex_str)
    }

    pub fn eth_chain_id(&self) -> Result<u64, RpcError> {
        let result = self.rpc_call("eth_chainId", json!([]))?;
        parse_u64("eth_chainId", &result)
    }

    /// Execute a JSON-RPC call with retry and backoff.
    fn rpc_call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let max_attempts = self.config.max_retries + 1;
        let mut last_error: Option<RpcError> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let backoff = self.backoff(attempt, last_error.as_ref());
                tracing::warn!(
                    method,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = ?last_error.as_ref().map(|e| e.to_string()),
                    "Retrying RPC call"
                );
                std::thread::sleep(backoff);
            }

            match self.rpc_call_once(method, &body) {
                Ok(val) => return Ok(val),
                Err(err) => {
                    if !err.is_retryable() || attempt + 1 >= max_attempts {
                        if attempt > 0 {
                            return Err(RpcError::RetryExhausted {
                                method: method.into(),
                                attempts: attempt + 1,
                                last_error: Box::new(err),
                            });
                        }
                        return Err(err);
                    }
                    last_error = Some(err);
                }
            }
        }

        Err(RpcError::RetryExhausted {
            method: method.into(),
            attempts: max_attempts,
            last_error: Box::new(
                last_error.unwrap_or_else(|| RpcError::parse(method, "", "unknown error")),
            ),
        })
    }

    /// Delay before retry `attempt` (1-based): Retry-After when the node sent
    /// one, otherwise `base * 2^(attempt-1)`.
    fn backoff(&self, attempt: u32, last_error: Option<&RpcError>) -> Duration {
        last_error
            .and_then(RpcError::retry_after_secs)
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.config.base_backoff * 2u32.saturating_pow(attempt - 1))
    }

    /// Single attempt at an RPC call (no retry).
    fn rpc_call_once(&self, method: &str, body: &Value) -> Result<Value, RpcError> {
        let response = self.http.post(&self.url).json(body).send().map_err(|e| {
            if e.is_timeout() {
                RpcError::Timeout {
                    method: method.into(),
                    elapsed_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                RpcError::ConnectionFailed {
                    url: self.url.clone(),
                    cause: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(|v| format!("retry-after:{v}"));

            let body = match retry_after {
                Some(hint) => hint,
                None => response.text().unwrap_or_default(),
            };

            return Err(RpcError::HttpError {
                method: method.into(),
                status: status.as_u16(),
                body,
            });
        }

        let json_response: Value = response
            .json()
            .map_err(|e| RpcError::parse(method, "response_body", e.to_string()))?;

        extract_result(method, json_response)
    }
}

impl BytecodeSource for EthRpcClient {
    fn get_code(&self, address: &str) -> Result<String, SourceError> {
        let addr = parse_address(address)
            .map_err(|_| RpcError::InvalidAddress(address.to_string()))?;
        let code = self.eth_get_code(addr)?;
        tracing::debug!(address, bytes = code.len(), "Fetched contract code");
        Ok(format!("0x{}", hex::encode(code)))
    }
}

// --- Parsing helpers ---

fn extract_result(method: &str, mut response: Value) -> Result<Value, RpcError> {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(-1);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        return Err(RpcError::JsonRpcError {
            method: method.into(),
            code,
            message,
        });
    }

    response
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| RpcError::parse(method, "result", "missing result field"))
}

fn hex_decode(method: &str, hex_str: &str) -> Result<Vec<u8>, RpcError> {
    let s = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(s).map_err(|e| RpcError::parse(method, "hex", e.to_string()))
}

fn parse_u64(method: &str, val: &Value) -> Result<u64, RpcError> {
    let s = val
        .as_str()
        .ok_or_else(|| RpcError::parse(method, "u64", "expected hex string"))?;
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).map_err(|e| RpcError::parse(method, "u64", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_decode_empty() {
        assert_eq!(hex_decode("eth_getCode", "0x").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_hex_decode_bytes() {
        assert_eq!(
            hex_decode("eth_getCode", "0xdeadbeef").unwrap(),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
        assert!(hex_decode("eth_getCode", "0xzz").is_err());
    }

    #[test]
    fn test_parse_u64_hex() {
        assert_eq!(parse_u64("eth_chainId", &json!("0x1")).unwrap(), 1);
        assert!(parse_u64("eth_chainId", &json!(1)).is_err());
    }

    #[test]
    fn test_extract_result() {
        let ok = json!({"jsonrpc": "2.0", "id": 1, "result": "0x6080"});
        assert_eq!(extract_result("eth_getCode", ok).unwrap(), json!("0x6080"));

        let err = json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "header not found"}});
        match extract_result("eth_getCode", err) {
            Err(RpcError::JsonRpcError { code, message, .. }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "header not found");
            }
            other => panic!("expected JsonRpcError, got {other:?}"),
        }

        let missing = json!({"jsonrpc": "2.0", "id": 1});
        assert!(matches!(
            extract_result("eth_getCode", missing),
            Err(RpcError::ParseError { .. })
        ));
    }

    #[test]
    fn test_config_from_toml() {
        let toml = RpcTomlConfig {
            timeout_secs: 5,
            connect_timeout_secs: 2,
            max_retries: 0,
            base_backoff_ms: 250,
        };
        let config = RpcConfig::from(&toml);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.base_backoff, Duration::from_millis(250));
        assert_eq!(RpcConfig::default().max_retries, 3);
    }

    #[test]
    fn test_backoff_doubles_and_respects_retry_after() {
        let client = EthRpcClient::with_config(
            "http://localhost:8545",
            RpcConfig {
                base_backoff: Duration::from_millis(100),
                ..Default::default()
            },
        );
        assert_eq!(client.backoff(1, None), Duration::from_millis(100));
        assert_eq!(client.backoff(3, None), Duration::from_millis(400));

        let limited = RpcError::HttpError {
            method: "eth_getCode".into(),
            status: 429,
            body: "retry-after:2".into(),
        };
        assert_eq!(client.backoff(1, Some(&limited)), Duration::from_secs(2));
    }

    #[test]
    fn test_block_tag() {
        let client = EthRpcClient::new("http://localhost:8545");
        assert_eq!(client.block_tag(), LATEST);
        assert_eq!(client.at_block(255).block_tag(), "0xff");
    }

    #[test]
    fn test_get_code_rejects_bad_address_without_network() {
        let client = EthRpcClient::new("http://127.0.0.1:1");
        let err = client.get_code("0x1234").unwrap_err();
        assert!(matches!(err, SourceError::Rpc(msg) if msg.contains("Invalid address")));
    }

    #[test]
    fn test_unreachable_node_is_connection_failure() {
        let client = EthRpcClient::with_config(
            "http://127.0.0.1:1",
            RpcConfig {
                max_retries: 0,
                connect_timeout: Duration::from_secs(1),
                ..Default::default()
            },
        );
        let err = client
            .eth_get_code(Address::from_low_u64_be(0x42))
            .unwrap_err();
        assert!(err.is_retryable(), "got {err:?}");
    }
}
