//! JSON-RPC client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::trace;

use super::types::{
    parse_quantity, parse_quantity_u128, parse_sync_state, Block, Receipt, RpcRequest,
    RpcResponse, Transaction,
};
use super::RpcError;
use crate::data::SyncState;

/// Block selector for methods that take a block tag or number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
    Number(u64),
}

impl BlockTag {
    fn to_param(self) -> Value {
        match self {
            BlockTag::Latest => json!("latest"),
            BlockTag::Pending => json!("pending"),
            BlockTag::Number(n) => json!(format!("0x{:x}", n)),
        }
    }
}

/// Client for an Ethereum-style JSON-RPC endpoint.
///
/// Every call is a single HTTP POST; a response carrying an `error` object is
/// returned as [`RpcError::Rpc`].
#[derive(Debug)]
pub struct RpcClient {
    http: Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` and deserialize its `result`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };
        trace!(method, id, "rpc request");

        let response = self.http.post(&self.url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(RpcError::Status(response.status().as_u16()));
        }

        let body: RpcResponse = response.json().await?;
        if let Some(err) = body.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(serde_json::from_value(body.result.unwrap_or(Value::Null))?)
    }

    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let hex: String = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(&hex)
    }

    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let hex: String = self.call("eth_chainId", json!([])).await?;
        parse_quantity(&hex)
    }

    pub async fn gas_price(&self) -> Result<u128, RpcError> {
        let hex: String = self.call("eth_gasPrice", json!([])).await?;
        parse_quantity_u128(&hex)
    }

    pub async fn net_version(&self) -> Result<String, RpcError> {
        self.call("net_version", json!([])).await
    }

    pub async fn syncing(&self) -> Result<SyncState, RpcError> {
        let value: Value = self.call("eth_syncing", json!([])).await?;
        parse_sync_state(&value)
    }

    /// Fetch a block header (transaction hashes only).
    pub async fn block(&self, tag: BlockTag) -> Result<Block, RpcError> {
        let block: Option<Block> = self
            .call("eth_getBlockByNumber", json!([tag.to_param(), false]))
            .await?;
        block.ok_or_else(|| RpcError::NotFound(format!("block {:?}", tag)))
    }

    pub async fn block_transaction_count(&self, tag: BlockTag) -> Result<u64, RpcError> {
        let hex: Option<String> = self
            .call("eth_getBlockTransactionCountByNumber", json!([tag.to_param()]))
            .await?;
        hex.map_or(Ok(0), |h| parse_quantity(&h))
    }

    /// Account nonce in the given view.
    pub async fn transaction_count(&self, address: &str, tag: BlockTag) -> Result<u64, RpcError> {
        let hex: String = self
            .call("eth_getTransactionCount", json!([address, tag.to_param()]))
            .await?;
        parse_quantity(&hex)
    }

    pub async fn balance(&self, address: &str) -> Result<u128, RpcError> {
        let hex: String = self
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_quantity_u128(&hex)
    }

    /// Deployed bytecode as a hex string (`"0x"` for accounts without code).
    pub async fn code(&self, address: &str) -> Result<String, RpcError> {
        self.call("eth_getCode", json!([address, "latest"])).await
    }

    pub async fn storage_at(&self, address: &str, slot: u64) -> Result<String, RpcError> {
        self.call(
            "eth_getStorageAt",
            json!([address, format!("0x{:x}", slot), "latest"]),
        )
        .await
    }

    pub async fn transaction(&self, hash: &str) -> Result<Transaction, RpcError> {
        let tx: Option<Transaction> = self
            .call("eth_getTransactionByHash", json!([hash]))
            .await?;
        tx.ok_or_else(|| RpcError::NotFound(format!("transaction {}", hash)))
    }

    /// Receipt, or `None` while the transaction is still pending.
    pub async fn receipt(&self, hash: &str) -> Result<Option<Receipt>, RpcError> {
        self.call("eth_getTransactionReceipt", json!([hash])).await
    }

    /// Call a probe method by name, discarding its result.
    pub async fn ping(&self, method: &str) -> Result<(), RpcError> {
        let _: Value = self.call(method, json!([])).await?;
        Ok(())
    }
}
