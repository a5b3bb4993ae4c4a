//! Data source abstraction for receiving monitor updates.
//!
//! The dashboard never talks to the node directly: it polls a
//! [`DataSource`] for [`MonitorUpdate`]s produced elsewhere, either by the
//! background poll loops of an [`RpcSource`] or pushed through a
//! [`ChannelSource`].

mod channel;
pub mod rpc;

pub use channel::ChannelSource;
pub use rpc::{check_health, probe_latency, spawn_pollers, PollConfig, PollerHandle, RpcSource};

use std::fmt::Debug;

use crate::data::MonitorUpdate;

/// Trait for receiving monitor updates from various sources.
///
/// # Example
///
/// ```
/// use chainwatch::{ChannelSource, DataSource};
///
/// let (_tx, mut source) = ChannelSource::create("test");
/// assert!(source.poll().is_none());
/// ```
pub trait DataSource: Send + Debug {
    /// Take the next pending update, if any.
    ///
    /// This method must not block.
    fn poll(&mut self) -> Option<MonitorUpdate>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Returns the error that stopped the source, if any.
    fn error(&self) -> Option<&str>;
}
