//! # chainwatch
//!
//! An operator console for an Ethereum-style chain: a live health dashboard,
//! a local API server wrapping a contract compiler and a deployment log, and
//! one-shot inspection commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │   app   │───▶│   data   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │(classify)│    │(render) │    │          │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └──────────┘  │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌─────────┐     ┌─────────┐                                 │
//! │  │ source  │◀────│   rpc   │◀── JSON-RPC node                │
//! │  │ (input) │     │(client) │                                 │
//! │  └─────────┘     └────┬────┘                                 │
//! │                       │                                      │
//! │  ┌─────────┐          │        ┌─────────┐                   │
//! │  │ server  │──────────┘        │ inspect │                   │
//! │  │ (axum)  │                   │(one-shot)                   │
//! │  └─────────┘                   └─────────┘                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`data`]**: health classification, latency samples, rolling histories
//!   and the aggregated [`ChainState`]
//! - **[`rpc`]**: typed JSON-RPC client ([`RpcClient`])
//! - **[`source`]**: the [`DataSource`] trait, the RPC poll loops
//!   ([`RpcSource`]) and a channel-fed source for embedding
//! - **[`app`]** / **[`ui`]** / **[`events`]**: the ratatui dashboard
//! - **[`server`]**: compiler proxy, deployment log and health endpoint
//! - **[`inspect`]**: address and transaction lookups
//! - **[`config`]**: layered [`Settings`]
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Dashboard against a local node
//! chainwatch --rpc-url http://127.0.0.1:8545
//!
//! # API server
//! chainwatch serve
//!
//! # One-shot health check for scripts (exit code 0/1/2)
//! chainwatch check --json
//! ```
//!
//! ### As a library with the RPC poll loops
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use chainwatch::{App, PollConfig, RpcClient, RpcSource};
//!
//! # tokio_test::block_on(async {
//! let client = RpcClient::new("http://127.0.0.1:8545", Duration::from_secs(10)).unwrap();
//! let source = RpcSource::spawn(Arc::new(client), PollConfig::default());
//! let app = App::new(Box::new(source), 30);
//! # });
//! ```
//!
//! ### As a library with a channel source
//!
//! ```
//! use chainwatch::{App, ChannelSource, HealthReport, MonitorUpdate};
//!
//! let (tx, source) = ChannelSource::create("replay");
//! let mut app = App::new(Box::new(source), 30);
//!
//! tx.try_send(MonitorUpdate::Health { seq: 1, report: HealthReport::unreachable() })
//!     .unwrap();
//! assert_eq!(app.reload_data(), 1);
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod inspect;
pub mod rpc;
pub mod server;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    ChainState, ChainStatus, ContractState, HealthReport, HealthSample, LatencySample,
    MonitorUpdate, Thresholds,
};
pub use rpc::{RpcClient, RpcError};
pub use source::{ChannelSource, DataSource, PollConfig, RpcSource};
