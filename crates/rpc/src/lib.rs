//! Blocking Ethereum JSON-RPC bytecode source for tvlscan.

mod client;
mod error;

pub use client::{EthRpcClient, RpcConfig};
pub use error::RpcError;
