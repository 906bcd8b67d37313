//! Run status monitoring

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use rflocal_common::{Error, Result, RunClient, RunStatus};

/// Poll a run until the service reports a terminal state.
///
/// Returns the final status when the run completed without failures and
/// `Error::RunFailed` otherwise.
pub async fn monitor_run(
    client: &dyn RunClient,
    run_id: i64,
    poll_interval: Duration,
) -> Result<RunStatus> {
    let mut last_report: Option<(String, u32)> = None;

    loop {
        let status = client.run_status(run_id).await?;

        let percent = status
            .current_progress
            .as_ref()
            .map(|p| p.percent)
            .unwrap_or(0);
        let report = (status.state.to_string(), percent);
        if last_report.as_ref() != Some(&report) {
            info!("Run {} is {}: {}% complete", run_id, status.state, percent);
            last_report = Some(report);
        } else {
            debug!("Run {} unchanged", run_id);
        }

        if status.is_finished() {
            return finish(status);
        }

        sleep(poll_interval).await;
    }
}

fn finish(status: RunStatus) -> Result<RunStatus> {
    if let Some(url) = &status.frontend_url {
        info!("Run {} details: {}", status.id, url);
    }

    if status.is_successful() {
        info!("Run {} {}", status.id, status.result);
        Ok(status)
    } else {
        Err(Error::RunFailed {
            id: status.id,
            state: status.state.to_string(),
            result: status.result.to_string(),
        })
    }
}
