//! JSON-RPC transport for Ethereum-style nodes.
//!
//! Speaks the minimal method set the gateway needs: `eth_call` for reads,
//! `eth_sendTransaction` for writes through an unlocked or proxied account,
//! and `eth_getTransactionReceipt` polled until the transaction lands.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::B256;
use async_trait::async_trait;
use custody_types::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::transport::{ChainTransport, TxHash, TxInclusion};

/// Error code wallets return when the user declines a request.
const USER_REJECTED: i64 = 4001;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// [`ChainTransport`] over HTTP JSON-RPC.
pub struct RpcTransport {
    http: reqwest::Client,
    url: String,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, method: &str, params: Value) -> RegistryResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest { jsonrpc: "2.0", method, params, id };
        debug!(method, id, "rpc request");
        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        if let Some(err) = parsed.error {
            if err.code == USER_REJECTED {
                return Err(RegistryError::Rejected(err.message));
            }
            return Err(RegistryError::Rpc { code: err.code, message: err.message });
        }
        parsed
            .result
            .ok_or_else(|| RegistryError::Transport("rpc response carries no result".into()))
    }

    async fn request_str(&self, method: &str, params: Value) -> RegistryResult<String> {
        let value = self.request(method, params).await?;
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| RegistryError::Transport(format!("{method} result is not a string")))
    }
}

#[async_trait]
impl ChainTransport for RpcTransport {
    async fn call(&self, to: Address, data: Vec<u8>) -> RegistryResult<Vec<u8>> {
        let params = json!([
            { "to": to.to_string(), "data": to_hex(&data) },
            "latest",
        ]);
        let result = self.request_str("eth_call", params).await?;
        parse_hex_bytes(&result)
    }

    async fn send(&self, from: Address, to: Address, data: Vec<u8>) -> RegistryResult<TxHash> {
        let params = json!([
            { "from": from.to_string(), "to": to.to_string(), "data": to_hex(&data) },
        ]);
        let result = self.request_str("eth_sendTransaction", params).await?;
        let bytes = parse_hex_bytes(&result)?;
        if bytes.len() != 32 {
            return Err(RegistryError::Transport(format!(
                "transaction hash has {} bytes, expected 32",
                bytes.len()
            )));
        }
        Ok(TxHash::new(B256::from_slice(&bytes)))
    }

    async fn wait_for_inclusion(&self, tx: TxHash) -> RegistryResult<TxInclusion> {
        loop {
            let receipt = self
                .request("eth_getTransactionReceipt", json!([tx.to_hex()]))
                .await?;
            if receipt.is_null() {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }
            let block_number = receipt
                .get("blockNumber")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    RegistryError::Transport("receipt lacks blockNumber".into())
                })
                .and_then(parse_hex_u64)?;
            let success = receipt
                .get("status")
                .and_then(Value::as_str)
                .map(|s| s == "0x1")
                .unwrap_or(false);
            debug!(tx = %tx, block_number, success, "transaction included");
            return Ok(TxInclusion { tx_hash: tx, block_number, success });
        }
    }
}

fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

fn parse_hex_bytes(s: &str) -> RegistryResult<Vec<u8>> {
    hex::decode(strip_hex_prefix(s))
        .map_err(|e| RegistryError::Transport(format!("invalid hex in rpc result: {e}")))
}

fn parse_hex_u64(s: &str) -> RegistryResult<u64> {
    u64::from_str_radix(strip_hex_prefix(s), 16)
        .map_err(|e| RegistryError::Transport(format!("invalid hex quantity: {e}")))
}
