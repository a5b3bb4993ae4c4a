//! Aggregated monitor state.
//!
//! [`ChainState`] is what the dashboard and the API server render: the most
//! recent health report and latency probe, plus the rolling histories that
//! feed the sparklines. It is mutated only through [`ChainState::apply`].

use std::time::Instant;

use serde::Serialize;

use super::health::{ChainStatus, HealthReport};
use super::history::RollingHistory;
use super::latency::LatencySample;

/// A single result emitted by one of the poll loops.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorUpdate {
    Health { seq: u64, report: HealthReport },
    Latency { seq: u64, sample: LatencySample },
}

impl MonitorUpdate {
    pub fn seq(&self) -> u64 {
        match self {
            MonitorUpdate::Health { seq, .. } | MonitorUpdate::Latency { seq, .. } => *seq,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChainState {
    pub health: Option<HealthReport>,
    pub latency: Option<LatencySample>,
    /// Block age in seconds, one entry per successful health tick.
    pub block_age_history: RollingHistory<i64>,
    /// Mean probe latency in milliseconds, one entry per probe with any success.
    pub latency_history: RollingHistory<f64>,
    pub last_updated: Option<Instant>,
    last_health_seq: Option<u64>,
    last_latency_seq: Option<u64>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new(super::history::DEFAULT_HISTORY_SIZE)
    }
}

impl ChainState {
    pub fn new(history_size: usize) -> Self {
        Self {
            health: None,
            latency: None,
            block_age_history: RollingHistory::new(history_size),
            latency_history: RollingHistory::new(history_size),
            last_updated: None,
            last_health_seq: None,
            last_latency_seq: None,
        }
    }

    /// Apply an update from a poll loop.
    ///
    /// Returns `false` and leaves the state untouched when the update is not
    /// newer than the last one applied from the same loop.
    pub fn apply(&mut self, update: MonitorUpdate) -> bool {
        match update {
            MonitorUpdate::Health { seq, report } => {
                if self.last_health_seq.is_some_and(|last| seq <= last) {
                    return false;
                }
                self.last_health_seq = Some(seq);
                if let Some(ref sample) = report.sample {
                    self.block_age_history.push(sample.block_age);
                }
                self.health = Some(report);
            }
            MonitorUpdate::Latency { seq, sample } => {
                if self.last_latency_seq.is_some_and(|last| seq <= last) {
                    return false;
                }
                self.last_latency_seq = Some(seq);
                if let Some(avg) = sample.average_ms() {
                    self.latency_history.push(avg);
                }
                self.latency = Some(sample);
            }
        }
        self.last_updated = Some(Instant::now());
        true
    }

    /// Current status; unknown until the first health tick lands.
    pub fn status(&self) -> Option<ChainStatus> {
        self.health.as_ref().map(|h| h.status)
    }

    /// Serializable view for export and the HTTP API.
    pub fn snapshot(&self) -> ChainSnapshot<'_> {
        ChainSnapshot {
            status: self.status(),
            health: self.health.as_ref(),
            latency: self.latency.as_ref(),
            average_latency_ms: self.latency.as_ref().and_then(|l| l.average_ms()),
            block_age_history: &self.block_age_history,
            latency_history: &self.latency_history,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChainSnapshot<'a> {
    pub status: Option<ChainStatus>,
    pub health: Option<&'a HealthReport>,
    pub latency: Option<&'a LatencySample>,
    pub average_latency_ms: Option<f64>,
    pub block_age_history: &'a RollingHistory<i64>,
    pub latency_history: &'a RollingHistory<f64>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::health::{HealthSample, SyncState};
    use crate::data::latency::MethodLatency;

    fn report(age: i64) -> HealthReport {
        HealthReport {
            status: ChainStatus::Operational,
            reasons: Vec::new(),
            sample: Some(HealthSample {
                block_number: 1,
                block_timestamp: 1,
                block_age: age,
                block_time: None,
                sequencer_nonce_gap: 0,
                mempool_stuck_count: 0,
                sync_state: SyncState::Synced,
            }),
        }
    }

    #[test]
    fn applies_health_and_records_age() {
        let mut state = ChainState::new(5);
        assert!(state.status().is_none());
        assert!(state.apply(MonitorUpdate::Health {
            seq: 1,
            report: report(7)
        }));
        assert_eq!(state.status(), Some(ChainStatus::Operational));
        assert_eq!(state.block_age_history.latest(), Some(&7));
        assert!(state.last_updated.is_some());
    }

    #[test]
    fn failed_tick_updates_status_but_not_history() {
        let mut state = ChainState::new(5);
        state.apply(MonitorUpdate::Health {
            seq: 1,
            report: report(3),
        });
        state.apply(MonitorUpdate::Health {
            seq: 2,
            report: HealthReport::unreachable(),
        });
        assert_eq!(state.status(), Some(ChainStatus::Down));
        assert_eq!(state.block_age_history.len(), 1);
    }

    #[test]
    fn stale_updates_are_ignored() {
        let mut state = ChainState::new(5);
        state.apply(MonitorUpdate::Health {
            seq: 4,
            report: report(1),
        });
        assert!(!state.apply(MonitorUpdate::Health {
            seq: 3,
            report: HealthReport::unreachable(),
        }));
        assert_eq!(state.status(), Some(ChainStatus::Operational));

        // Sequences are tracked per loop
        assert!(state.apply(MonitorUpdate::Latency {
            seq: 1,
            sample: LatencySample::new(vec![MethodLatency::ok(
                "eth_blockNumber",
                Duration::from_millis(12)
            )]),
        }));
        assert_eq!(state.latency_history.len(), 1);
    }

    #[test]
    fn latency_without_success_is_not_recorded() {
        let mut state = ChainState::new(5);
        state.apply(MonitorUpdate::Latency {
            seq: 1,
            sample: LatencySample::new(vec![MethodLatency::failed("eth_chainId", "boom")]),
        });
        assert!(state.latency.is_some());
        assert!(state.latency_history.is_empty());
    }

    #[test]
    fn snapshot_serializes() {
        let mut state = ChainState::new(5);
        state.apply(MonitorUpdate::Health {
            seq: 1,
            report: report(9),
        });
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(json["status"], "operational");
        assert_eq!(json["block_age_history"], serde_json::json!([9]));
        assert_eq!(json["health"]["sample"]["sync_state"]["state"], "synced");
    }
}
