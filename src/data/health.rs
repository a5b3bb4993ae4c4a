//! Chain health classification.
//!
//! Turns the raw signals gathered on each poll tick into a [`HealthReport`]:
//! a coarse [`ChainStatus`] plus every human-readable reason that fired.
//! The classification is a pure function of the signals and the wall clock,
//! so it is tested here without any network access.

use std::time::Duration;

use serde::Serialize;

use super::duration::format_age;

/// Thresholds for chain status computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Block age above which the chain is degraded.
    pub degraded_age: Duration,
    /// Block age above which a nonce gap or mempool backlog means the chain is down.
    pub stalled_age: Duration,
    /// Block age above which the chain is down outright.
    pub down_age: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            degraded_age: Duration::from_secs(60),
            stalled_age: Duration::from_secs(120),
            down_age: Duration::from_secs(300),
        }
    }
}

/// Coarse chain liveness tier. Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainStatus {
    Operational,
    Degraded,
    Down,
}

impl ChainStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            ChainStatus::Operational => "OK",
            ChainStatus::Degraded => "WARN",
            ChainStatus::Down => "DOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChainStatus::Operational => "Operational",
            ChainStatus::Degraded => "Degraded",
            ChainStatus::Down => "Down",
        }
    }
}

/// Node synchronisation state as reported by `eth_syncing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SyncState {
    Synced,
    Syncing { current: u64, highest: u64 },
}

impl SyncState {
    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncState::Syncing { .. })
    }
}

/// Raw per-tick inputs, as read from the node.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthSignals {
    pub block_number: u64,
    pub block_timestamp: u64,
    /// Timestamp of the block before `block_number`, if it exists.
    pub previous_timestamp: Option<u64>,
    pub sync_state: SyncState,
    pub pending_tx_count: u64,
    pub latest_tx_count: u64,
    /// Block producer's nonce in the `latest` view.
    pub producer_confirmed_nonce: u64,
    /// Block producer's nonce in the `pending` view.
    pub producer_pending_nonce: u64,
}

/// One immutable observation of the chain, produced per poll tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSample {
    pub block_number: u64,
    pub block_timestamp: u64,
    /// Seconds since the latest block. Negative only under clock skew.
    pub block_age: i64,
    /// Seconds between the latest block and its parent.
    pub block_time: Option<u64>,
    pub sequencer_nonce_gap: u64,
    pub mempool_stuck_count: u64,
    pub sync_state: SyncState,
}

impl HealthSample {
    /// Derive a sample from raw signals at wall-clock time `now` (UNIX seconds).
    pub fn from_signals(signals: &HealthSignals, now: u64) -> Self {
        Self {
            block_number: signals.block_number,
            block_timestamp: signals.block_timestamp,
            block_age: i64::try_from(now)
                .unwrap_or(i64::MAX)
                .saturating_sub(i64::try_from(signals.block_timestamp).unwrap_or(i64::MAX)),
            block_time: signals
                .previous_timestamp
                .map(|prev| signals.block_timestamp.saturating_sub(prev)),
            sequencer_nonce_gap: signals
                .producer_pending_nonce
                .saturating_sub(signals.producer_confirmed_nonce),
            mempool_stuck_count: signals.pending_tx_count.saturating_sub(signals.latest_tx_count),
            sync_state: signals.sync_state,
        }
    }
}

/// Outcome of one health tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: ChainStatus,
    pub reasons: Vec<String>,
    /// Absent when the node could not be read at all.
    pub sample: Option<HealthSample>,
}

impl HealthReport {
    /// The report used when the RPC batch failed: assume the worst.
    pub fn unreachable() -> Self {
        Self {
            status: ChainStatus::Down,
            reasons: Vec::new(),
            sample: None,
        }
    }

    /// Classify a sample against the thresholds.
    pub fn classify(sample: HealthSample, thresholds: &Thresholds) -> Self {
        let age = sample.block_age;
        let mut status = ChainStatus::Operational;
        let mut reasons = Vec::new();

        if age > thresholds.down_age.as_secs() as i64 {
            status = ChainStatus::Down;
            reasons.push(format!("No new blocks for {}", format_age(age)));
        } else if age > thresholds.degraded_age.as_secs() as i64 {
            status = ChainStatus::Degraded;
            reasons.push(format!(
                "Block production slow: last block {} ago",
                format_age(age)
            ));
        }

        let gap = sample.sequencer_nonce_gap;
        if gap > 0 {
            status = status.max(ChainStatus::Degraded);
            let noun = if gap == 1 { "tx" } else { "txs" };
            reasons.push(format!("Sequencer has {} unconfirmed {}", gap, noun));
        }

        let backlog = sample.mempool_stuck_count;
        if backlog > 0 {
            status = status.max(ChainStatus::Degraded);
            reasons.push(format!(
                "Mempool backlog: {} more txs pending than in latest block",
                backlog
            ));
        }

        // Stale blocks plus either stall signal compound into an outage
        if age > thresholds.stalled_age.as_secs() as i64 && (gap > 0 || backlog > 0) {
            status = ChainStatus::Down;
        }

        if let SyncState::Syncing { current, highest } = sample.sync_state {
            if status == ChainStatus::Operational {
                status = ChainStatus::Degraded;
                reasons.push(format!("Node is syncing ({}/{})", current, highest));
            }
        }

        Self {
            status,
            reasons,
            sample: Some(sample),
        }
    }

    /// Reasons joined for single-line display.
    pub fn reason_line(&self) -> String {
        self.reasons.join("; ")
    }
}
