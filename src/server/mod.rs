//! Local API server.
//!
//! Exposes the compiler proxy, the deployment log and the server's own view
//! of chain health over HTTP. The health view is fed by the same poll loops
//! the dashboard uses, running inside the server process.
//!
//! | Method | Path               | Body                                   |
//! |--------|--------------------|----------------------------------------|
//! | POST   | `/api/compile`     | `{ source, contract_name }`            |
//! | GET    | `/api/deployments` |                                        |
//! | POST   | `/api/deployments` | `{ address, tx_hash, deployer, label }` |
//! | GET    | `/api/health`      |                                        |

mod compile;
mod deployments;
mod error;

pub use compile::{parse_combined_json, CompileError, CompiledContract, Compiler, CompilerConfig};
pub use deployments::{DeploymentLog, DeploymentRecord, NewDeployment, StoreError};
pub use error::ApiError;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::Settings;
use crate::data::ChainState;
use crate::rpc::RpcClient;
use crate::source::rpc::unix_now;
use crate::source::spawn_pollers;

/// Shared handles passed to every handler.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub compiler: Arc<Compiler>,
    pub deployments: Arc<Mutex<DeploymentLog>>,
    pub chain: Arc<RwLock<ChainState>>,
}

impl ServerState {
    pub fn new(compiler: Compiler, deployments: DeploymentLog, chain: ChainState) -> Self {
        Self {
            compiler: Arc::new(compiler),
            deployments: Arc::new(Mutex::new(deployments)),
            chain: Arc::new(RwLock::new(chain)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompileRequest {
    pub source: String,
    pub contract_name: String,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/compile", post(compile_contract))
        .route(
            "/api/deployments",
            get(list_deployments).post(record_deployment),
        )
        .route("/api/health", get(chain_health))
        .with_state(state)
}

async fn compile_contract(
    State(state): State<ServerState>,
    body: Result<Json<CompileRequest>, JsonRejection>,
) -> Result<Json<CompiledContract>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    match state
        .compiler
        .compile(&request.source, &request.contract_name)
        .await
    {
        Ok(compiled) => {
            info!(contract = %compiled.contract_name, "compiled contract");
            Ok(Json(compiled))
        }
        Err(e) => {
            warn!(contract = %request.contract_name, error = %e, "compile failed");
            Err(e.into())
        }
    }
}

async fn list_deployments(State(state): State<ServerState>) -> Json<Vec<DeploymentRecord>> {
    Json(state.deployments.lock().await.newest_first())
}

async fn record_deployment(
    State(state): State<ServerState>,
    body: Result<Json<NewDeployment>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let record = state.deployments.lock().await.record(new, unix_now()).await?;
    info!(address = %record.address, label = %record.label, "recorded deployment");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn chain_health(State(state): State<ServerState>) -> Result<Json<Value>, ApiError> {
    let chain = state.chain.read().await;
    serde_json::to_value(chain.snapshot())
        .map(Json)
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Run the API server until Ctrl-C.
///
/// Starts the poll loops against the configured node and keeps the shared
/// [`ChainState`] current for `/api/health`.
pub async fn serve(settings: &Settings) -> Result<()> {
    let deployments = DeploymentLog::load(&settings.deployments.log_path).with_context(|| {
        format!(
            "failed to open deployment log {}",
            settings.deployments.log_path.display()
        )
    })?;
    let state = ServerState::new(
        Compiler::new(settings.compiler_config()),
        deployments,
        ChainState::new(settings.monitor.history_size),
    );

    let client = Arc::new(RpcClient::new(&settings.rpc.url, settings.rpc.timeout)?);
    let (mut updates, pollers) = spawn_pollers(client, settings.poll_config());
    let chain = state.chain.clone();
    let applier = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            chain.write().await.apply(update);
        }
    });

    let listener = TcpListener::bind(&settings.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind))?;
    info!(
        addr = %listener.local_addr()?,
        rpc = %settings.rpc.url,
        "api server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
        .context("api server failed")?;

    pollers.abort();
    applier.abort();
    info!("api server stopped");
    Ok(())
}
