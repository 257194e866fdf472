//! Periodic reporting over a snapshot file of managed objects

use anyhow::{Context, Result};
use recommender_metrics::{ManagedObject, MetricsRegistry, RecommendationReporter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

/// Read the managed objects stored as a JSON array at `path`
pub async fn load_objects(path: &Path) -> Result<Vec<ManagedObject>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let objects = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
    Ok(objects)
}

/// Drives one reporting cycle per tick against a snapshot file
pub struct ReportingLoop {
    metrics: MetricsRegistry,
    snapshot_path: PathBuf,
    reporter: RecommendationReporter,
}

impl ReportingLoop {
    pub fn new(metrics: MetricsRegistry, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            metrics,
            snapshot_path: snapshot_path.into(),
            reporter: RecommendationReporter::new(),
        }
    }

    /// Run a single cycle. A snapshot that cannot be loaded skips the cycle
    /// and leaves the previously reported values in place.
    pub async fn run_once(&mut self) -> bool {
        let objects = match load_objects(&self.snapshot_path).await {
            Ok(objects) => objects,
            Err(e) => {
                warn!(
                    event = "report_skipped",
                    error = %format!("{:#}", e),
                    "Could not load managed objects, skipping cycle"
                );
                return false;
            }
        };

        self.reporter.report(&self.metrics, &objects);
        true
    }

    /// Run cycles every `period` until the task is dropped
    pub async fn run(mut self, period: Duration) {
        info!(
            snapshot = %self.snapshot_path.display(),
            interval_secs = period.as_secs(),
            "Starting reporting loop"
        );

        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }
}
