//! RPC-backed data source.
//!
//! Two independent loops run on the tokio runtime: the health loop reads
//! the chain every `health_interval` and classifies it, the latency loop
//! times the probe methods every `latency_interval`. Each loop awaits its
//! own tick to completion before starting the next, and tags every update
//! with a per-loop sequence number.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::DataSource;
use crate::data::{
    HealthReport, HealthSample, HealthSignals, LatencySample, MethodLatency, MonitorUpdate,
    Thresholds, PROBE_METHODS,
};
use crate::rpc::{BlockTag, RpcClient, RpcError};

const CHANNEL_CAPACITY: usize = 16;

/// Timing and classification settings for the poll loops.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub health_interval: Duration,
    pub latency_interval: Duration,
    pub thresholds: Thresholds,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            health_interval: Duration::from_secs(10),
            latency_interval: Duration::from_secs(15),
            thresholds: Thresholds::default(),
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Read every input the health classification needs.
///
/// Fails as a whole if any single call fails.
pub async fn read_signals(client: &RpcClient) -> Result<HealthSignals, RpcError> {
    let (latest, sync_state, pending_tx_count, latest_tx_count) = tokio::try_join!(
        client.block(BlockTag::Latest),
        client.syncing(),
        client.block_transaction_count(BlockTag::Pending),
        client.block_transaction_count(BlockTag::Latest),
    )?;

    let block_number = latest.number()?;
    let block_timestamp = latest.timestamp()?;
    let producer = latest.miner.as_str();

    let previous = async {
        match block_number.checked_sub(1) {
            Some(parent) => client.block(BlockTag::Number(parent)).await.map(Some),
            None => Ok(None),
        }
    };
    let (previous, producer_confirmed_nonce, producer_pending_nonce) = tokio::try_join!(
        previous,
        client.transaction_count(producer, BlockTag::Latest),
        client.transaction_count(producer, BlockTag::Pending),
    )?;

    Ok(HealthSignals {
        block_number,
        block_timestamp,
        previous_timestamp: previous.map(|b| b.timestamp()).transpose()?,
        sync_state,
        pending_tx_count,
        latest_tx_count,
        producer_confirmed_nonce,
        producer_pending_nonce,
    })
}

/// Run one health tick: read the chain and classify it.
///
/// Any RPC failure yields [`HealthReport::unreachable`].
pub async fn check_health(client: &RpcClient, thresholds: &Thresholds) -> HealthReport {
    match read_signals(client).await {
        Ok(signals) => {
            let sample = HealthSample::from_signals(&signals, unix_now());
            let report = HealthReport::classify(sample, thresholds);
            debug!(
                status = ?report.status,
                block = signals.block_number,
                reasons = %report.reason_line(),
                "health tick"
            );
            report
        }
        Err(e) => {
            warn!(error = %e, url = client.url(), "health tick failed");
            HealthReport::unreachable()
        }
    }
}

/// Time each probe method once, sequentially.
pub async fn probe_latency(client: &RpcClient) -> LatencySample {
    let mut probes = Vec::with_capacity(PROBE_METHODS.len());
    for method in PROBE_METHODS {
        let start = Instant::now();
        let probe = match client.ping(method).await {
            Ok(()) => MethodLatency::ok(method, start.elapsed()),
            Err(e) => {
                debug!(method, error = %e, "latency probe failed");
                MethodLatency::failed(method, e.to_string())
            }
        };
        probes.push(probe);
    }
    LatencySample::new(probes)
}

/// Aborts the poll loops when dropped.
#[derive(Debug)]
pub struct PollerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn abort(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Spawn the health and latency loops on the current tokio runtime.
///
/// Must be called from within a runtime context.
pub fn spawn_pollers(
    client: Arc<RpcClient>,
    config: PollConfig,
) -> (mpsc::Receiver<MonitorUpdate>, PollerHandle) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let PollConfig {
        health_interval,
        latency_interval,
        thresholds,
    } = config;

    let health = {
        let client = client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(health_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq = 0;
            loop {
                timer.tick().await;
                seq += 1;
                let report = check_health(&client, &thresholds).await;
                if tx.send(MonitorUpdate::Health { seq, report }).await.is_err() {
                    break;
                }
            }
        })
    };

    let latency = tokio::spawn(async move {
        let mut timer = tokio::time::interval(latency_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seq = 0;
        loop {
            timer.tick().await;
            seq += 1;
            let sample = probe_latency(&client).await;
            if tx.send(MonitorUpdate::Latency { seq, sample }).await.is_err() {
                break;
            }
        }
    });

    (
        rx,
        PollerHandle {
            tasks: vec![health, latency],
        },
    )
}

/// A data source backed by the RPC poll loops.
///
/// Dropping the source stops both loops.
#[derive(Debug)]
pub struct RpcSource {
    receiver: mpsc::Receiver<MonitorUpdate>,
    _pollers: PollerHandle,
    description: String,
    last_error: Option<String>,
}

impl RpcSource {
    /// Start polling `client`. Must be called from within a runtime context.
    pub fn spawn(client: Arc<RpcClient>, config: PollConfig) -> Self {
        let description = format!("rpc: {}", client.url());
        let (receiver, pollers) = spawn_pollers(client, config);
        Self {
            receiver,
            _pollers: pollers,
            description,
            last_error: None,
        }
    }
}

impl DataSource for RpcSource {
    fn poll(&mut self) -> Option<MonitorUpdate> {
        match self.receiver.try_recv() {
            Ok(update) => Some(update),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.last_error = Some("Poll loops stopped".to_string());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ChainStatus;

    fn dead_client() -> Arc<RpcClient> {
        Arc::new(RpcClient::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap())
    }

    #[tokio::test]
    async fn unreachable_node_reports_down() {
        let report = check_health(&dead_client(), &Thresholds::default()).await;
        assert_eq!(report.status, ChainStatus::Down);
        assert!(report.reasons.is_empty());
    }

    #[tokio::test]
    async fn unreachable_node_fails_every_probe() {
        let sample = probe_latency(&dead_client()).await;
        assert_eq!(sample.probes.len(), PROBE_METHODS.len());
        assert_eq!(sample.failures(), PROBE_METHODS.len());
        assert!(sample.average_ms().is_none());
    }

    #[tokio::test]
    async fn pollers_emit_on_first_tick() {
        let (mut rx, handle) = spawn_pollers(dead_client(), PollConfig::default());
        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.seq(), 1);
        drop(handle);
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            health_interval: Duration::from_millis(20),
            latency_interval: Duration::from_millis(20),
            thresholds: Thresholds::default(),
        }
    }

    #[tokio::test]
    async fn dropping_handle_stops_both_loops() {
        let (mut rx, handle) = spawn_pollers(dead_client(), fast_config());
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        drop(handle);

        // Both senders go away with their tasks, so the channel closes
        let closed = tokio::time::timeout(Duration::from_secs(2), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok(), "poll loops still running after drop");
    }

    #[tokio::test]
    async fn dropping_source_releases_client() {
        let client = dead_client();
        let source = RpcSource::spawn(client.clone(), fast_config());
        assert!(Arc::strong_count(&client) > 1);
        drop(source);

        let released = tokio::time::timeout(Duration::from_secs(2), async {
            while Arc::strong_count(&client) > 1 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(released.is_ok(), "poll loops still hold the client after drop");
    }
}
