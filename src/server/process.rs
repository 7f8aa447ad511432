// src/server/process.rs
use crate::config::Config;
use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use uuid::Uuid;

/// Unique identifier for a server instance.
///
/// Doubles as the Elasticsearch node name so that log lines from
/// overlapping test runs can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    // Private constructor, only usable within our crate
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "es-runner-{}", self.0)
    }
}

/// Lifecycle state of a server controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Constructed, no directory or process yet
    Idle,
    /// Spawned, waiting for the readiness probe
    Starting,
    /// Answering its readiness probe
    Running,
    /// Terminal; the instance cannot be started again
    Stopped,
}

/// A running Elasticsearch server child process.
///
/// Exclusively owned by the controller; the child is configured to be
/// killed if the handle is dropped without an explicit termination, so a
/// discarded controller cannot leak a background server across test runs.
pub struct ServerProcess {
    /// Instance ID, used as the node name
    id: InstanceId,
    /// Child process
    child: Child,
}

impl ServerProcess {
    /// Spawn the server with configuration derived for a single-node test
    /// instance: data path, log path, bind address and port, and discovery
    /// disabled. Standard output and error are piped and drained into
    /// `tracing` so the child can never block on a full pipe.
    pub(crate) fn spawn(
        config: &Config,
        host: &str,
        port: u16,
        data_path: &Path,
        logs_path: &Path,
    ) -> Result<Self> {
        let id = InstanceId::new();

        let mut command = Command::new(&config.command);
        command.args(&config.args);
        command
            .arg(format!("-Enetwork.host={}", host))
            .arg(format!("-Ehttp.port={}", port))
            .arg(format!("-Epath.data={}", data_path.display()))
            .arg(format!("-Epath.logs={}", logs_path.display()))
            .arg("-Ediscovery.type=single-node")
            .arg("-Expack.security.enabled=false")
            .arg(format!("-Enode.name={}", id));

        if let Some(java_opts) = &config.java_opts {
            command.env("ES_JAVA_OPTS", java_opts);
        }

        // Set environment variables
        for (key, value) in &config.env {
            command.env(key, value);
        }

        // Configure stdio
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Start the process
        let mut child = command.spawn().map_err(|e| {
            Error::Process(format!("Failed to start '{}': {}", config.command, e))
        })?;

        if let Some(stdout) = child.stdout.take() {
            drain_output(id, "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            drain_output(id, "stderr", stderr);
        }

        tracing::debug!(node = %id, pid = ?child.id(), "Spawned server process");
        Ok(Self { id, child })
    }

    /// Get the instance ID
    pub(crate) fn id(&self) -> InstanceId {
        self.id
    }

    /// Check whether the child has already exited, without blocking.
    pub(crate) fn try_exit_status(&mut self) -> Result<Option<ExitStatus>> {
        self.child
            .try_wait()
            .map_err(|e| Error::Process(format!("Failed to poll server process: {}", e)))
    }

    /// Terminate the child: graceful signal first, bounded wait, then a
    /// forceful kill. Never fails; after this returns the process is gone.
    pub(crate) async fn terminate(mut self, grace: Duration) {
        if let Some(pid) = self.child.id() {
            if signal_term(pid) {
                match tokio::time::timeout(grace, self.child.wait()).await {
                    Ok(Ok(status)) => {
                        tracing::debug!(node = %self.id, %status, "Server exited gracefully");
                        return;
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(node = %self.id, error = %e, "Failed to await server exit");
                    }
                    Err(_) => {
                        tracing::debug!(
                            node = %self.id,
                            grace = ?grace,
                            "Grace period elapsed, escalating to forceful kill"
                        );
                    }
                }
            }
        }

        self.kill().await;
    }

    /// Forcefully kill the child and reap it. Used when startup fails and
    /// as the escalation path of [`ServerProcess::terminate`].
    pub(crate) async fn kill(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::warn!(node = %self.id, error = %e, "Failed to kill server process");
        } else {
            tracing::debug!(node = %self.id, "Server process killed");
        }
    }

    /// Synchronous best-effort kill for destructor paths, where awaiting
    /// the child is not possible. The kernel reaps the process.
    pub(crate) fn abort(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::warn!(node = %self.id, error = %e, "Failed to signal server process");
        }
    }
}

fn drain_output(id: InstanceId, stream: &'static str, source: impl AsyncRead + Unpin + Send + 'static) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(source).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::trace!(node = %id, "{}: {}", stream, line);
        }
    });
}

#[cfg(unix)]
fn signal_term(pid: u32) -> bool {
    // SAFETY: `kill(2)` is memory-safe even when the PID is stale; the
    // kernel simply returns an error. We only translate the integer and
    // use the standard SIGTERM signal.
    let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if result != 0 {
        tracing::debug!(
            pid,
            error = %std::io::Error::last_os_error(),
            "SIGTERM not delivered"
        );
    }
    result == 0
}

#[cfg(not(unix))]
fn signal_term(_pid: u32) -> bool {
    // No graceful signal on this platform; fall through to the kill path.
    false
}
