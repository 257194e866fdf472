//! Recommender exporter
//!
//! Periodically reports the recommendations of a snapshot of managed objects
//! and serves them for Prometheus scraping.

use anyhow::Result;
use recommender_exporter::{api, config::ExporterConfig, snapshot::ReportingLoop, supervisor};
use recommender_metrics::MetricsRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(
        event = "exporter_started",
        version = EXPORTER_VERSION,
        "Starting recommender-exporter"
    );

    let config = ExporterConfig::load();
    info!(
        api_port = config.api_port,
        snapshot = %config.snapshot_path.display(),
        interval_secs = config.report_interval_secs,
        "Exporter configured"
    );

    let metrics = MetricsRegistry::new()?;

    let reporting = ReportingLoop::new(metrics.clone(), config.snapshot_path.clone());
    let report_handle = tokio::spawn(
        reporting.run(Duration::from_secs(config.report_interval_secs.max(1))),
    );

    let app_state = Arc::new(api::AppState::new(metrics));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    supervisor::run_until_stopped(report_handle, api_handle, tokio::signal::ctrl_c()).await
}
