//! AlarmSrv Configuration
//!
//! Layered with figment: defaults, then an optional YAML file, then
//! `ALARMSRV_` environment variables (nested keys split on `__`, e.g.
//! `ALARMSRV_CYCLE__NOTIFY_INTERVAL_MS=500`).

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file locations, first match wins
const CONFIG_PATHS: [&str; 3] = [
    "config/alarmsrv/alarmsrv.yaml",
    "config/alarmsrv.yaml",
    "alarmsrv.yaml",
];

/// Alarm service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AlarmSrvConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Service identity and logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Console log filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Notify / merge / purge cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Interval between notification cycles in milliseconds
    #[serde(default = "default_notify_interval_ms")]
    pub notify_interval_ms: u64,
    /// Purge completed alarms right after each merge
    #[serde(default = "default_true")]
    pub purge_after_merge: bool,
}

/// Persisted state
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// JSON array of alarms restored at startup
    #[serde(default)]
    pub initial_alarms: Option<PathBuf>,
}

fn default_service_name() -> String {
    "alarmsrv".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_notify_interval_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            notify_interval_ms: default_notify_interval_ms(),
            purge_after_merge: true,
        }
    }
}

impl CycleConfig {
    pub fn notify_interval(&self) -> Duration {
        Duration::from_millis(self.notify_interval_ms)
    }
}

impl AlarmSrvConfig {
    /// Load configuration from `path`, or from the first default location
    /// that exists. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let yaml_path = match path {
            Some(p) => {
                if !p.exists() {
                    bail!("Config file not found: {}", p.display());
                }
                Some(p.to_path_buf())
            },
            None => CONFIG_PATHS
                .into_iter()
                .map(PathBuf::from)
                .find(|p| p.exists()),
        };

        let mut figment = Figment::from(Serialized::defaults(AlarmSrvConfig::default()));
        if let Some(p) = &yaml_path {
            figment = figment.merge(Yaml::file(p));
        }
        figment = figment.merge(Env::prefixed("ALARMSRV_").split("__"));

        Self::from_figment(figment)
    }

    /// Extract and validate from an assembled figment
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .context("Failed to load alarmsrv configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cycle.notify_interval_ms == 0 {
            bail!("cycle.notify_interval_ms must be greater than zero");
        }
        if self.service.name.trim().is_empty() {
            bail!("service.name must not be empty");
        }
        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config() -> String {
        let config = Self::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate config file".to_string())
    }
}
