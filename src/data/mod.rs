//! Data models and processing for chain observations.
//!
//! This module turns raw node readings into health-annotated data suitable
//! for display and export.
//!
//! ## Submodules
//!
//! - [`contract`]: Display mirror of the on-chain contract lifecycle
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "10s", "500ms")
//! - [`health`]: Chain status classification ([`HealthReport`], [`ChainStatus`])
//! - [`history`]: Bounded rolling histories for sparklines
//! - [`latency`]: RPC latency probe results
//! - [`monitor`]: Aggregated state ([`ChainState`]) fed by [`MonitorUpdate`]s
//! - [`validate`]: Address, hash and contract-name validation
//!
//! ## Data Flow
//!
//! ```text
//! HealthSignals (raw RPC readings)
//!        │
//!        ▼
//! HealthSample::from_signals() ──▶ HealthReport::classify()
//!        │
//!        ▼
//! MonitorUpdate::Health ──▶ ChainState::apply()
//!                                  │
//!                                  └──▶ RollingHistory (for sparklines)
//! ```

pub mod contract;
pub mod duration;
pub mod health;
pub mod history;
pub mod latency;
pub mod monitor;
pub mod validate;

pub use contract::ContractState;
pub use health::{ChainStatus, HealthReport, HealthSample, HealthSignals, SyncState, Thresholds};
pub use history::RollingHistory;
pub use latency::{LatencySample, MethodLatency, PROBE_METHODS};
pub use monitor::{ChainSnapshot, ChainState, MonitorUpdate};
pub use validate::{validate_address, validate_hash, ValidationError};
