//! End-to-end checks against an in-process JSON-RPC node.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use chainwatch::data::PROBE_METHODS;
use chainwatch::inspect::{inspect_address, inspect_transaction, InspectError};
use chainwatch::source::{check_health, probe_latency};
use chainwatch::{ChainStatus, ContractState, RpcClient, Thresholds};

const PRODUCER: &str = "0x4200000000000000000000000000000000000011";
const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Chain state served by the fake node.
#[derive(Debug, Clone)]
struct FakeChain {
    block_number: u64,
    /// Timestamp of the head block, fixed when the chain is built.
    head_timestamp: u64,
    confirmed_nonce: u64,
    pending_nonce: u64,
    latest_tx_count: u64,
    pending_tx_count: u64,
    syncing: Value,
    /// Methods answered with a JSON-RPC error.
    failing: Vec<&'static str>,
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn hex(n: u64) -> String {
    format!("0x{:x}", n)
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::aged(5)
    }
}

impl FakeChain {
    /// A chain whose head block is `age` seconds old.
    fn aged(age: u64) -> Self {
        Self {
            block_number: 1_000,
            head_timestamp: now() - age,
            confirmed_nonce: 42,
            pending_nonce: 42,
            latest_tx_count: 3,
            pending_tx_count: 3,
            syncing: json!(false),
            failing: Vec::new(),
        }
    }

    fn block(&self, number: u64) -> Value {
        let timestamp = self.head_timestamp - (self.block_number - number) * 2;
        json!({
            "number": hex(number),
            "hash": format!("0x{:064x}", number),
            "parentHash": format!("0x{:064x}", number.saturating_sub(1)),
            "timestamp": hex(timestamp),
            "miner": PRODUCER,
            "transactions": [],
        })
    }

    fn answer(&self, method: &str, params: &Value) -> Result<Value, (i64, String)> {
        if self.failing.iter().any(|m| *m == method) {
            return Err((-32000, format!("{} unavailable", method)));
        }
        let tag = params.get(0).and_then(Value::as_str).unwrap_or("latest");
        Ok(match method {
            "eth_blockNumber" => json!(hex(self.block_number)),
            "eth_chainId" => json!("0x7a69"),
            "eth_gasPrice" => json!("0x3b9aca00"),
            "net_version" => json!("31337"),
            "eth_syncing" => self.syncing.clone(),
            "eth_getBlockByNumber" => match tag {
                "latest" | "pending" => self.block(self.block_number),
                n => {
                    let number = u64::from_str_radix(n.trim_start_matches("0x"), 16).unwrap();
                    self.block(number)
                }
            },
            "eth_getBlockTransactionCountByNumber" => match tag {
                "pending" => json!(hex(self.pending_tx_count)),
                _ => json!(hex(self.latest_tx_count)),
            },
            "eth_getTransactionCount" => {
                match params.get(1).and_then(Value::as_str) {
                    Some("pending") => json!(hex(self.pending_nonce)),
                    _ => json!(hex(self.confirmed_nonce)),
                }
            }
            "eth_getCode" => json!("0x6080604052"),
            "eth_getBalance" => json!("0x14d1120d7b160000"), // 1.5 ETH
            "eth_getStorageAt" => match params.get(1).and_then(Value::as_str) {
                Some("0x3") => json!(format!("0x{:064x}", 5)),
                Some("0x4") => json!(format!("0x{:064x}", 0xff01)),
                _ => json!(format!("0x{:064x}", 0)),
            },
            "eth_getTransactionByHash" => json!({
                "hash": tag,
                "from": PRODUCER,
                "to": null,
                "value": "0x0",
                "nonce": "0x2a",
                "blockNumber": hex(self.block_number),
            }),
            "eth_getTransactionReceipt" => json!({
                "status": "0x1",
                "gasUsed": "0x5208",
                "contractAddress": CONTRACT,
                "blockNumber": hex(self.block_number),
            }),
            other => return Err((-32601, format!("method {} not found", other))),
        })
    }
}

async fn rpc(State(chain): State<Arc<FakeChain>>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default();
    let params = request.get("params").cloned().unwrap_or(json!([]));
    Json(match chain.answer(method, &params) {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }),
    })
}

/// Serve `chain` on an ephemeral port and return a client for it.
async fn spawn_node(chain: FakeChain) -> RpcClient {
    let app = Router::new()
        .route("/", post(rpc))
        .with_state(Arc::new(chain));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    RpcClient::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fresh_chain_is_operational() {
    let client = spawn_node(FakeChain::default()).await;
    let report = check_health(&client, &Thresholds::default()).await;

    assert_eq!(report.status, ChainStatus::Operational, "{:?}", report);
    assert!(report.reasons.is_empty());
    let sample = report.sample.unwrap();
    assert_eq!(sample.block_number, 1_000);
    assert_eq!(sample.block_time, Some(2));
    assert!(sample.block_age <= 6);
}

#[tokio::test]
async fn unconfirmed_sequencer_txs_degrade() {
    let client = spawn_node(FakeChain {
        pending_nonce: 44,
        ..FakeChain::aged(10)
    })
    .await;
    let report = check_health(&client, &Thresholds::default()).await;

    assert_eq!(report.status, ChainStatus::Degraded);
    assert!(report.reason_line().contains("2 unconfirmed txs"));
}

#[tokio::test]
async fn stalled_chain_is_down() {
    let client = spawn_node(FakeChain::aged(400)).await;
    let report = check_health(&client, &Thresholds::default()).await;

    assert_eq!(report.status, ChainStatus::Down);
    assert!(report.reasons[0].contains("No new blocks for"));
}

#[tokio::test]
async fn syncing_node_is_degraded() {
    let client = spawn_node(FakeChain {
        syncing: json!({ "currentBlock": "0x10", "highestBlock": "0x20" }),
        ..FakeChain::default()
    })
    .await;
    let report = check_health(&client, &Thresholds::default()).await;

    assert_eq!(report.status, ChainStatus::Degraded);
    assert_eq!(report.reasons, ["Node is syncing (16/32)"]);
}

#[tokio::test]
async fn any_failed_call_means_down_without_reasons() {
    let client = spawn_node(FakeChain {
        failing: vec!["eth_getTransactionCount"],
        ..FakeChain::aged(90)
    })
    .await;
    let report = check_health(&client, &Thresholds::default()).await;

    assert_eq!(report.status, ChainStatus::Down);
    assert!(report.reasons.is_empty());
    assert!(report.sample.is_none());
}

#[tokio::test]
async fn latency_probe_excludes_failures_from_mean() {
    let client = spawn_node(FakeChain {
        failing: vec!["eth_gasPrice"],
        ..FakeChain::default()
    })
    .await;
    let sample = probe_latency(&client).await;

    assert_eq!(sample.probes.len(), PROBE_METHODS.len());
    assert_eq!(sample.failures(), 1);
    let failed = sample.probes.iter().find(|p| !p.is_ok()).unwrap();
    assert_eq!(failed.method, "eth_gasPrice");
    assert!(sample.average_ms().is_some());
}

#[tokio::test]
async fn inspects_contract_address() {
    let client = spawn_node(FakeChain::default()).await;

    let report = inspect_address(&client, CONTRACT, Some(4), Some(3))
        .await
        .unwrap();
    assert_eq!(report.code_size, 5);
    assert_eq!(report.balance, "1.5 ETH");
    assert_eq!(report.state.as_ref().unwrap().state, Some(ContractState::Production));
    assert!(report.slot.as_ref().unwrap().value.ends_with("ff01"));

    // A slot holding something else does not decode as a state
    let report = inspect_address(&client, CONTRACT, None, Some(4)).await.unwrap();
    assert_eq!(report.state.unwrap().state, None);
}

#[tokio::test]
async fn inspects_deployment_transaction() {
    let client = spawn_node(FakeChain::default()).await;
    let hash = format!("0x{}", "ab".repeat(32));

    let report = inspect_transaction(&client, &hash).await.unwrap();
    assert_eq!(report.block_number, Some(1_000));
    assert_eq!(report.succeeded, Some(true));
    assert_eq!(report.gas_used, Some(21_000));
    assert_eq!(report.contract_address.as_deref(), Some(CONTRACT));
    assert!(report.to.is_none());
}

#[tokio::test]
async fn node_errors_surface_from_inspector() {
    let client = spawn_node(FakeChain {
        failing: vec!["eth_getCode"],
        ..FakeChain::default()
    })
    .await;
    let err = inspect_address(&client, CONTRACT, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, InspectError::Rpc(_)));
}
