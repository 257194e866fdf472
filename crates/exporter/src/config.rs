//! Exporter configuration

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

/// Exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// Port serving `/metrics` and `/healthz`
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// JSON file holding the managed objects to report on
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Seconds between reporting cycles
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_api_port() -> u16 {
    8942
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("/etc/recommender/objects.json")
}

fn default_report_interval() -> u64 {
    60
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            snapshot_path: default_snapshot_path(),
            report_interval_secs: default_report_interval(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from `EXPORTER_*` environment variables
    pub fn load() -> Self {
        Self::from_source(config::Environment::with_prefix("EXPORTER").try_parsing(true))
    }

    /// Load configuration from any `config` source, falling back to defaults
    pub fn from_source<S>(source: S) -> Self
    where
        S: config::Source + Send + Sync + 'static,
    {
        let loaded = config::Config::builder()
            .add_source(source)
            .build()
            .and_then(|c| c.try_deserialize::<ExporterConfig>());

        match loaded {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Invalid exporter configuration, using defaults");
                Self::default()
            }
        }
    }
}
