//! Wire types for the Ethereum-style JSON-RPC methods the monitor uses.
//!
//! Quantities arrive as `0x`-prefixed hex strings; they are kept as strings
//! on the wire structs and decoded through [`parse_quantity`] on access.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RpcError;
use crate::data::SyncState;

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Value,
    pub id: u64,
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

/// Decode a hex quantity (`"0x1a"`) into a `u64`.
pub fn parse_quantity(value: &str) -> Result<u64, RpcError> {
    let hex = strip_hex(value)?;
    u64::from_str_radix(hex, 16)
        .map_err(|e| RpcError::Parse(format!("invalid quantity {:?}: {}", value, e)))
}

/// Decode a hex quantity that may exceed `u64` (balances, values).
pub fn parse_quantity_u128(value: &str) -> Result<u128, RpcError> {
    let hex = strip_hex(value)?;
    u128::from_str_radix(hex, 16)
        .map_err(|e| RpcError::Parse(format!("invalid quantity {:?}: {}", value, e)))
}

fn strip_hex(value: &str) -> Result<&str, RpcError> {
    let hex = value
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Parse(format!("quantity {:?} is missing 0x prefix", value)))?;
    if hex.is_empty() {
        return Ok("0");
    }
    Ok(hex)
}

/// Render a wei amount as ether with up to 6 decimal places.
pub fn format_wei(wei: u128) -> String {
    const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
    let whole = wei / WEI_PER_ETHER;
    let micro = (wei % WEI_PER_ETHER) / 1_000_000_000_000;
    if micro == 0 {
        format!("{} ETH", whole)
    } else {
        let frac = format!("{:06}", micro);
        format!("{}.{} ETH", whole, frac.trim_end_matches('0'))
    }
}

/// Block header as returned by `eth_getBlockByNumber(_, false)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: String,
    pub hash: Option<String>,
    pub parent_hash: String,
    pub timestamp: String,
    pub miner: String,
    #[serde(default)]
    pub transactions: Vec<Value>,
}

impl Block {
    pub fn number(&self) -> Result<u64, RpcError> {
        parse_quantity(&self.number)
    }

    pub fn timestamp(&self) -> Result<u64, RpcError> {
        parse_quantity(&self.timestamp)
    }
}

/// Transaction as returned by `eth_getTransactionByHash`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub nonce: String,
    pub block_number: Option<String>,
}

/// Receipt as returned by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub status: Option<String>,
    pub gas_used: String,
    pub contract_address: Option<String>,
    pub block_number: String,
}

impl Receipt {
    /// `Some(true)` for success, `Some(false)` for revert, `None` for
    /// pre-Byzantium receipts without a status field.
    pub fn succeeded(&self) -> Option<bool> {
        self.status
            .as_deref()
            .and_then(|s| parse_quantity(s).ok())
            .map(|s| s == 1)
    }
}

/// Decode the `eth_syncing` result: `false` or a progress object.
pub fn parse_sync_state(value: &Value) -> Result<SyncState, RpcError> {
    match value {
        Value::Bool(false) | Value::Null => Ok(SyncState::Synced),
        Value::Object(progress) => {
            let field = |name: &str| -> Result<u64, RpcError> {
                progress
                    .get(name)
                    .and_then(Value::as_str)
                    .map(parse_quantity)
                    .unwrap_or(Ok(0))
            };
            Ok(SyncState::Syncing {
                current: field("currentBlock")?,
                highest: field("highestBlock")?,
            })
        }
        other => Err(RpcError::Parse(format!(
            "unexpected eth_syncing result: {}",
            other
        ))),
    }
}
