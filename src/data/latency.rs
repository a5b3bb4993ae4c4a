//! RPC latency probe results.

use std::time::Duration;

use serde::Serialize;

/// The lightweight methods timed on every latency probe, in call order.
pub const PROBE_METHODS: [&str; 5] = [
    "eth_blockNumber",
    "eth_chainId",
    "eth_gasPrice",
    "net_version",
    "eth_syncing",
];

/// Outcome of timing a single RPC method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodLatency {
    pub method: String,
    pub latency_ms: Option<f64>,
    pub error: Option<String>,
}

impl MethodLatency {
    pub fn ok(method: &str, elapsed: Duration) -> Self {
        Self {
            method: method.to_string(),
            latency_ms: Some(elapsed.as_secs_f64() * 1_000.0),
            error: None,
        }
    }

    pub fn failed(method: &str, error: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            latency_ms: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.latency_ms.is_some()
    }
}

/// One latency probe across every method in [`PROBE_METHODS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySample {
    pub probes: Vec<MethodLatency>,
}

impl LatencySample {
    pub fn new(probes: Vec<MethodLatency>) -> Self {
        Self { probes }
    }

    /// Mean latency over successful probes; `None` if every probe failed.
    pub fn average_ms(&self) -> Option<f64> {
        let ok: Vec<f64> = self.probes.iter().filter_map(|p| p.latency_ms).collect();
        if ok.is_empty() {
            None
        } else {
            Some(ok.iter().sum::<f64>() / ok.len() as f64)
        }
    }

    pub fn failures(&self) -> usize {
        self.probes.iter().filter(|p| !p.is_ok()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_skips_failures() {
        let sample = LatencySample::new(vec![
            MethodLatency::ok("eth_blockNumber", Duration::from_millis(10)),
            MethodLatency::failed("eth_chainId", "timeout"),
            MethodLatency::ok("eth_gasPrice", Duration::from_millis(30)),
        ]);
        let avg = sample.average_ms().unwrap();
        assert!((avg - 20.0).abs() < 1e-9);
        assert_eq!(sample.failures(), 1);
    }

    #[test]
    fn all_failed_has_no_average() {
        let sample = LatencySample::new(
            PROBE_METHODS
                .iter()
                .map(|m| MethodLatency::failed(m, "connection refused"))
                .collect(),
        );
        assert_eq!(sample.average_ms(), None);
        assert_eq!(sample.failures(), 5);
    }
}
