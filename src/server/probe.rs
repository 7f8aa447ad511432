// src/server/probe.rs
use crate::error::{Error, Result};
use crate::server::process::ServerProcess;
use std::time::{Duration, Instant};

/// Upper bound on a single probe request, so a wedged accept queue cannot
/// stall the poll loop past the overall deadline.
const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Poll the server's root HTTP endpoint until it answers with a success
/// status, the child exits, or the deadline elapses.
///
/// A fixed-interval poll is sufficient for a test fixture; the probe
/// checks for an early child exit between attempts so that a server that
/// lost the bind race fails fast instead of consuming the whole timeout.
pub(crate) async fn wait_until_ready(
    process: &mut ServerProcess,
    url: &str,
    interval: Duration,
    timeout: Duration,
) -> Result<()> {
    let client = reqwest::Client::new();
    let deadline = Instant::now() + timeout;

    tracing::debug!(%url, ?timeout, "Waiting for server readiness");

    loop {
        if let Some(status) = process.try_exit_status()? {
            return Err(Error::BindFailure(format!(
                "Server process exited before becoming ready: {}",
                status
            )));
        }

        match client
            .get(url)
            .timeout(PROBE_REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(%url, status = %response.status(), "Readiness probe succeeded");
                return Ok(());
            }
            Ok(response) => {
                tracing::trace!(%url, status = %response.status(), "Server answering but not ready");
            }
            Err(e) => {
                tracing::trace!(%url, error = %e, "Readiness probe failed");
            }
        }

        if Instant::now() + interval >= deadline {
            return Err(Error::StartupTimeout(format!(
                "Server at {} did not become ready within {:?}",
                url, timeout
            )));
        }

        tokio::time::sleep(interval).await;
    }
}
