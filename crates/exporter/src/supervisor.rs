//! Lifetime of the exporter's background tasks

use anyhow::{anyhow, Result};
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Wait until the API server fails, the reporting loop stops, or `shutdown`
/// resolves.
///
/// The reporting loop never finishes on its own, so its exit is an error.
/// A failure of `shutdown` itself (e.g. installing the signal handler) is
/// returned rather than treated as a shutdown request.
pub async fn run_until_stopped<F>(
    mut report_handle: JoinHandle<()>,
    api_handle: JoinHandle<Result<()>>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    let outcome = tokio::select! {
        res = api_handle => {
            match res {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(e.into()),
            }
        }
        res = &mut report_handle => {
            error!(
                event = "reporting_stopped",
                error = ?res.as_ref().err(),
                "Reporting loop exited"
            );
            match res {
                Ok(()) => Err(anyhow!("reporting loop exited")),
                Err(e) => Err(anyhow::Error::new(e).context("reporting loop failed")),
            }
        }
        res = shutdown => {
            res.map(|()| {
                info!(event = "exporter_shutdown", reason = "SIGINT received", "Shutting down");
            })
            .map_err(anyhow::Error::from)
        }
    };

    report_handle.abort();
    outcome
}
