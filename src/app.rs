//! Application state and navigation logic.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::json;

use crate::data::{ChainState, ChainStatus};
use crate::server::{DeploymentLog, DeploymentRecord};
use crate::source::DataSource;
use crate::ui::deployments::{sort_deployments, DeploymentSort};
use crate::ui::Theme;

/// How often the header pulse toggles.
const PULSE_INTERVAL: Duration = Duration::from_secs(1);

/// The current view/tab in the TUI.
///
/// Deployment detail is shown as an overlay (controlled by
/// `App::show_detail_overlay`) rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Current health sample, reasons and block-age trend.
    Health,
    /// Per-method probe latencies and mean-latency trend.
    Latency,
    /// Local deployment log.
    Deployments,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Health => View::Latency,
            View::Latency => View::Deployments,
            View::Deployments => View::Health,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            View::Health => View::Deployments,
            View::Latency => View::Health,
            View::Deployments => View::Latency,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Health => "Health",
            View::Latency => "Latency",
            View::Deployments => "Deployments",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Data source
    source: Box<dyn DataSource>,
    pub state: ChainState,
    pub load_error: Option<String>,

    // Deployment log (read-only here; the API server writes it)
    deployments_path: Option<PathBuf>,
    pub deployments: Vec<DeploymentRecord>,

    // Navigation state
    pub selected_probe_index: usize,
    pub selected_deployment_index: usize,

    // Sorting (Deployments view)
    pub sort_column: DeploymentSort,
    pub sort_ascending: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,
    pub pulse_on: bool,
    last_pulse: Instant,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading updates from `source`.
    pub fn new(source: Box<dyn DataSource>, history_size: usize) -> Self {
        Self {
            running: true,
            current_view: View::Health,
            show_help: false,
            show_detail_overlay: false,
            source,
            state: ChainState::new(history_size),
            load_error: None,
            deployments_path: None,
            deployments: Vec::new(),
            selected_probe_index: 0,
            selected_deployment_index: 0,
            sort_column: DeploymentSort::default(),
            sort_ascending: false, // newest first
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::auto_detect(),
            pulse_on: false,
            last_pulse: Instant::now(),
            status_message: None,
        }
    }

    /// Show the deployment log at `path` in the Deployments view.
    pub fn with_deployment_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.deployments_path = Some(path.into());
        self.reload_deployments();
        self
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Advance the live pulse; called once per render loop iteration.
    pub fn tick(&mut self) {
        if self.last_pulse.elapsed() >= PULSE_INTERVAL {
            self.pulse_on = !self.pulse_on;
            self.last_pulse = Instant::now();
        }
    }

    pub fn status(&self) -> Option<ChainStatus> {
        self.state.status()
    }

    /// Drain every pending update from the source into the chain state.
    ///
    /// Returns the number of updates applied. Stale updates are dropped by
    /// [`ChainState::apply`] and not counted.
    pub fn reload_data(&mut self) -> usize {
        let mut applied = 0;
        while let Some(update) = self.source.poll() {
            if self.state.apply(update) {
                applied += 1;
            }
        }

        self.load_error = self.source.error().map(str::to_string);

        if let Some(ref latency) = self.state.latency {
            if self.selected_probe_index >= latency.probes.len() {
                self.selected_probe_index = latency.probes.len().saturating_sub(1);
            }
        }
        applied
    }

    /// Re-read the deployment log from disk.
    pub fn reload_deployments(&mut self) {
        let Some(path) = self.deployments_path.clone() else {
            return;
        };
        match DeploymentLog::load(&path) {
            Ok(log) => {
                self.deployments = log.records().to_vec();
                let count = self.filtered_deployment_count();
                if self.selected_deployment_index >= count {
                    self.selected_deployment_index = count.saturating_sub(1);
                }
            }
            Err(e) => {
                self.set_status_message(format!("Deployment log: {}", e));
            }
        }
    }

    /// Manual refresh: drain the source and re-read the deployment log.
    pub fn refresh(&mut self) {
        let applied = self.reload_data();
        self.reload_deployments();
        self.set_status_message(format!("Refreshed ({} new updates)", applied));
    }

    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            View::Health => {}
            View::Latency => {
                let max = self.probe_count().saturating_sub(1);
                self.selected_probe_index = (self.selected_probe_index + n).min(max);
            }
            View::Deployments => {
                let max = self.filtered_deployment_count().saturating_sub(1);
                self.selected_deployment_index = (self.selected_deployment_index + n).min(max);
            }
        }
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Health => {}
            View::Latency => {
                self.selected_probe_index = self.selected_probe_index.saturating_sub(n);
            }
            View::Deployments => {
                self.selected_deployment_index = self.selected_deployment_index.saturating_sub(n);
            }
        }
    }

    pub fn select_first(&mut self) {
        match self.current_view {
            View::Health => {}
            View::Latency => self.selected_probe_index = 0,
            View::Deployments => self.selected_deployment_index = 0,
        }
    }

    pub fn select_last(&mut self) {
        match self.current_view {
            View::Health => {}
            View::Latency => {
                self.selected_probe_index = self.probe_count().saturating_sub(1);
            }
            View::Deployments => {
                self.selected_deployment_index = self.filtered_deployment_count().saturating_sub(1);
            }
        }
    }

    fn probe_count(&self) -> usize {
        self.state.latency.as_ref().map_or(0, |l| l.probes.len())
    }

    fn filtered_deployment_count(&self) -> usize {
        self.deployments
            .iter()
            .filter(|d| self.matches_filter(d))
            .count()
    }

    /// Deployments after filtering and sorting, in display order.
    pub fn visible_deployments(&self) -> Vec<&DeploymentRecord> {
        let mut records: Vec<&DeploymentRecord> = self
            .deployments
            .iter()
            .filter(|d| self.matches_filter(d))
            .collect();
        sort_deployments(&mut records, self.sort_column, self.sort_ascending);
        records
    }

    /// The deployment under the cursor in the Deployments view.
    pub fn selected_deployment(&self) -> Option<&DeploymentRecord> {
        self.visible_deployments()
            .get(self.selected_deployment_index)
            .copied()
    }

    /// Open the detail overlay for the selected deployment.
    pub fn enter_detail(&mut self) {
        if self.current_view == View::Deployments && self.selected_deployment().is_some() {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close overlay first, then clear the filter, then go to Health.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        if !self.filter_text.is_empty() {
            self.clear_filter();
            return;
        }
        self.current_view = View::Health;
    }

    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn cycle_sort(&mut self) {
        if self.current_view == View::Deployments {
            self.sort_column = self.sort_column.next();
        }
    }

    pub fn toggle_sort_direction(&mut self) {
        if self.current_view == View::Deployments {
            self.sort_ascending = !self.sort_ascending;
        }
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.selected_deployment_index = 0;
    }

    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Case-insensitive match against label, address, deployer and tx hash.
    pub fn matches_filter(&self, record: &DeploymentRecord) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        let needle = self.filter_text.to_lowercase();
        [
            &record.label,
            &record.address,
            &record.deployer,
            &record.tx_hash,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the chain state and deployment log to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if self.state.health.is_none() && self.deployments.is_empty() {
            anyhow::bail!("No data to export");
        }

        let export = json!({
            "source": self.source_description(),
            "chain": self.state.snapshot(),
            "deployments": self.deployments,
        });
        std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::data::{HealthReport, LatencySample, MethodLatency, MonitorUpdate};
    use crate::source::ChannelSource;

    fn record(label: &str, timestamp: u64) -> DeploymentRecord {
        DeploymentRecord {
            address: format!("0x{:040x}", timestamp),
            tx_hash: format!("0x{:064x}", timestamp),
            deployer: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            label: label.to_string(),
            timestamp,
        }
    }

    fn app() -> (mpsc::Sender<MonitorUpdate>, App) {
        let (tx, source) = ChannelSource::create("test");
        (tx, App::new(Box::new(source), 30))
    }

    #[test]
    fn view_cycle_wraps() {
        assert_eq!(View::Health.next().next().next(), View::Health);
        assert_eq!(View::Health.prev(), View::Deployments);
    }

    #[test]
    fn reload_applies_updates_in_order() {
        let (tx, mut app) = app();
        tx.try_send(MonitorUpdate::Health {
            seq: 2,
            report: HealthReport::unreachable(),
        })
        .unwrap();
        tx.try_send(MonitorUpdate::Health {
            seq: 1,
            report: HealthReport::unreachable(),
        })
        .unwrap();

        assert_eq!(app.reload_data(), 1);
        assert_eq!(app.status(), Some(ChainStatus::Down));
        assert!(app.load_error.is_none());
    }

    #[test]
    fn disconnected_source_sets_error() {
        let (tx, mut app) = app();
        drop(tx);
        app.reload_data();
        assert!(app.load_error.is_some());
    }

    #[test]
    fn latency_selection_is_clamped() {
        let (tx, mut app) = app();
        app.set_view(View::Latency);
        tx.try_send(MonitorUpdate::Latency {
            seq: 1,
            sample: LatencySample::new(vec![
                MethodLatency::ok("eth_blockNumber", Duration::from_millis(3)),
                MethodLatency::failed("eth_chainId", "boom"),
            ]),
        })
        .unwrap();
        app.reload_data();
        app.select_next_n(10);
        assert_eq!(app.selected_probe_index, 1);
    }

    #[test]
    fn filter_and_sort_deployments() {
        let (_tx, mut app) = app();
        app.deployments = vec![record("vault", 1), record("registry", 3), record("vault-v2", 2)];
        app.set_view(View::Deployments);

        let labels: Vec<_> = app.visible_deployments().iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["registry", "vault-v2", "vault"]);

        for c in "VAULT".chars() {
            app.filter_push(c);
        }
        assert_eq!(app.visible_deployments().len(), 2);

        app.enter_detail();
        assert!(app.show_detail_overlay);
        app.go_back();
        assert!(!app.show_detail_overlay);
        app.go_back();
        assert!(app.filter_text.is_empty());
    }

    #[test]
    fn export_requires_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let (_tx, mut app) = app();
        assert!(app.export_state(&path).is_err());

        app.deployments = vec![record("vault", 1)];
        app.export_state(&path).unwrap();
        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(exported["deployments"][0]["label"], "vault");
        assert_eq!(exported["source"], "test");
    }
}
