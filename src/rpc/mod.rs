//! JSON-RPC access to the chain.
//!
//! [`RpcClient`] wraps the handful of Ethereum-style methods the monitor,
//! the latency probe and the inspector need. Failures surface as
//! [`RpcError`]; a JSON-RPC `error` object is always a hard failure.

mod client;
mod error;
pub mod types;

pub use client::{BlockTag, RpcClient};
pub use error::RpcError;
pub use types::{format_wei, Block, Receipt, Transaction};
