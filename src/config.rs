//! Layered settings.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `CHAINWATCH__SECTION__KEY` environment variables. Durations are written as
//! human strings (`"10s"`, `"500ms"`).
//!
//! ```toml
//! [rpc]
//! url = "https://rpc.example.org"
//! timeout = "5s"
//!
//! [monitor]
//! health_interval = "10s"
//! down_age = "5m"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::data::duration::parse_duration;
use crate::data::history::MAX_HISTORY_SIZE;
use crate::data::Thresholds;
use crate::server::CompilerConfig;
use crate::source::PollConfig;

/// Default settings file, read if present.
pub const DEFAULT_CONFIG_FILE: &str = "chainwatch.toml";

fn de_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpc: RpcSettings,
    pub monitor: MonitorSettings,
    pub server: ServerSettings,
    pub compiler: CompilerSettings,
    pub deployments: DeploymentSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcSettings {
    pub url: String,
    #[serde(deserialize_with = "de_duration")]
    pub timeout: Duration,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    #[serde(deserialize_with = "de_duration")]
    pub health_interval: Duration,
    #[serde(deserialize_with = "de_duration")]
    pub latency_interval: Duration,
    #[serde(deserialize_with = "de_duration")]
    pub degraded_age: Duration,
    #[serde(deserialize_with = "de_duration")]
    pub stalled_age: Duration,
    #[serde(deserialize_with = "de_duration")]
    pub down_age: Duration,
    pub history_size: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        let poll = PollConfig::default();
        Self {
            health_interval: poll.health_interval,
            latency_interval: poll.latency_interval,
            degraded_age: thresholds.degraded_age,
            stalled_age: thresholds.stalled_age,
            down_age: thresholds.down_age,
            history_size: crate::data::history::DEFAULT_HISTORY_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    pub binary: PathBuf,
    pub args: Vec<String>,
    #[serde(deserialize_with = "de_duration")]
    pub timeout: Duration,
    pub max_source_len: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        let defaults = CompilerConfig::default();
        Self {
            binary: defaults.binary,
            args: defaults.args,
            timeout: defaults.timeout,
            max_source_len: defaults.max_source_len,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploymentSettings {
    pub log_path: PathBuf,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("deployments.json"),
        }
    }
}

impl Settings {
    /// Load settings from `path` (required) or from [`DEFAULT_CONFIG_FILE`]
    /// if it exists, layered under environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("CHAINWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read settings")?;

        let settings: Settings = config.try_deserialize().context("invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the poll loops and histories cannot run with.
    pub fn validate(&self) -> Result<()> {
        let monitor = &self.monitor;
        ensure!(!self.rpc.timeout.is_zero(), "rpc.timeout must be non-zero");
        ensure!(
            !monitor.health_interval.is_zero(),
            "monitor.health_interval must be non-zero"
        );
        ensure!(
            !monitor.latency_interval.is_zero(),
            "monitor.latency_interval must be non-zero"
        );
        ensure!(
            (1..=MAX_HISTORY_SIZE).contains(&monitor.history_size),
            "monitor.history_size must be between 1 and {}",
            MAX_HISTORY_SIZE
        );
        ensure!(
            monitor.degraded_age <= monitor.stalled_age && monitor.stalled_age <= monitor.down_age,
            "monitor ages must satisfy degraded_age <= stalled_age <= down_age"
        );
        ensure!(!self.compiler.timeout.is_zero(), "compiler.timeout must be non-zero");
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            degraded_age: self.monitor.degraded_age,
            stalled_age: self.monitor.stalled_age,
            down_age: self.monitor.down_age,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            health_interval: self.monitor.health_interval,
            latency_interval: self.monitor.latency_interval,
            thresholds: self.thresholds(),
        }
    }

    pub fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            binary: self.compiler.binary.clone(),
            args: self.compiler.args.clone(),
            timeout: self.compiler.timeout,
            max_source_len: self.compiler.max_source_len,
        }
    }
}
