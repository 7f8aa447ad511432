/*!
 # es-runner

 A Rust library for running transient Elasticsearch server instances inside
 integration tests.

 ## Overview

 es-runner provides functionality to:
 - Start a single-node Elasticsearch server as a child process
 - Wait until the server actually answers HTTP before handing it to a test
 - Expose the bound `host:port` endpoint, including ephemeral ports
 - Guarantee process termination and temporary-storage removal on teardown

 ## Basic Usage

 ```no_run
 use es_runner::{ElasticsearchServer, Result};

 #[tokio::main]
 async fn main() -> Result<()> {
     // Start a throwaway single-node server
     let mut server = ElasticsearchServer::new();
     server.start().await?;

     // The endpoint is reachable as soon as start() returns
     let dsn = server.dsn()?;
     println!("Elasticsearch answering on http://{}", dsn);

     // Kills the process and removes the temporary directory
     server.stop().await;
     Ok(())
 }
 ```

 The scoped form pairs start and stop on every exit path, including an
 error inside the block:

 ```no_run
 use es_runner::{ElasticsearchServer, Result};

 #[tokio::main]
 async fn main() -> Result<()> {
     let hits = ElasticsearchServer::new()
         .scoped(|endpoint| async move {
             // exercise the server at endpoint.http_url() ...
             Ok(0_u64)
         })
         .await?;
     println!("{} hits", hits);
     Ok(())
 }
 ```

 ## Features

 - **Lifecycle Management**: Start, probe, and stop a server instance
 - **Resource Ownership**: Temporary directories are removed on stop; caller-supplied directories are never touched
 - **Scoped Runs**: Guaranteed teardown on every exit path
 - **Drop Safety Net**: A discarded running controller still kills its child
 - **Configuration**: Programmatic or JSON-file configuration
 - **Async Support**: Full async/await support

 ## License

 This project is licensed under the terms in the LICENSE file.
*/

pub mod config;
pub mod error;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
pub use server::{InstanceId, ServerState};

use std::fmt;
use std::future::Future;
use std::net::TcpListener;
use std::path::Path;

use server::workdir::WorkDir;
use server::{ServerProcess, probe};

/// Network endpoint of a running server instance.
///
/// Holds the host and port the server actually bound, which for an
/// ephemeral-port configuration differs from anything the caller asked
/// for. Displays as `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// HTTP URL of the server root, suitable for an HTTP client.
    pub fn http_url(&self) -> String {
        format!("http://{}", self)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Controller for one transient Elasticsearch server instance.
///
/// Owns the full lifecycle: resolving or creating the working directory,
/// choosing the bind address, launching the child process, polling until
/// the service answers, and terminating the process plus conditionally
/// erasing the working directory on stop.
///
/// A controller moves through [`ServerState::Idle`] →
/// [`ServerState::Starting`] → [`ServerState::Running`] →
/// [`ServerState::Stopped`] exactly once; `Stopped` is terminal and a
/// stopped instance cannot be restarted. Construction is side-effect-free.
/// All public lifecycle methods are instrumented with `tracing` spans.
pub struct ElasticsearchServer {
    /// Configuration
    config: Config,
    /// Working directory, present from `Starting` until `stop()`
    workdir: Option<WorkDir>,
    /// Child process, present iff `Running` (or transiently `Starting`)
    process: Option<ServerProcess>,
    /// Bound endpoint, present iff `Running`
    endpoint: Option<Endpoint>,
    /// Lifecycle state
    state: ServerState,
}

impl ElasticsearchServer {
    /// Create a controller with the default configuration: an
    /// `elasticsearch` entry point from the PATH, a loopback bind host,
    /// an ephemeral port, and a temporary working directory.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a controller from a configuration.
    ///
    /// No side effects occur beyond storing the configuration, so
    /// constructing an instance is cheap and safe for introspection.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(config), fields(command = %config.command))]
    pub fn with_config(config: Config) -> Self {
        tracing::debug!("Creating new ElasticsearchServer controller");
        Self {
            config,
            workdir: None,
            process: None,
            endpoint: None,
            state: ServerState::Idle,
        }
    }

    /// Get the lifecycle state
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Root of the working directory while the controller manages one,
    /// from `Starting` until `stop()` has released it.
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(|w| w.root())
    }

    /// Start the server and wait until it answers its readiness probe.
    ///
    /// Returns successfully only once an HTTP request to the server root
    /// reports a success status, never before. On failure the
    /// partially-started child process is terminated and an owned working
    /// directory is removed before the error surfaces, so a failed start
    /// leaks nothing.
    ///
    /// A controller can only be started once: calling `start()` on an
    /// instance that is not [`ServerState::Idle`] fails with
    /// [`Error::InvalidState`]. Use a fresh controller per server.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self))]
    pub async fn start(&mut self) -> Result<()> {
        if self.state != ServerState::Idle {
            tracing::warn!(state = ?self.state, "start() rejected outside Idle");
            return Err(Error::InvalidState(format!(
                "start() requires an idle controller, but state is {:?}",
                self.state
            )));
        }

        config::validate_config(&self.config)?;
        self.state = ServerState::Starting;
        tracing::info!("Starting Elasticsearch server");

        match self.launch_and_await_ready().await {
            Ok(()) => {
                self.state = ServerState::Running;
                // endpoint is set by launch_and_await_ready on success
                if let Some(endpoint) = &self.endpoint {
                    tracing::info!(dsn = %endpoint, "Server is ready");
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Startup failed, cleaning up partial state");
                if let Some(process) = self.process.take() {
                    process.kill().await;
                }
                if let Some(workdir) = self.workdir.take() {
                    workdir.cleanup();
                }
                self.endpoint = None;
                self.state = ServerState::Stopped;
                Err(e)
            }
        }
    }

    async fn launch_and_await_ready(&mut self) -> Result<()> {
        let workdir = match &self.config.root {
            Some(root) => WorkDir::external(root.clone())?,
            None => WorkDir::owned()?,
        };

        let host = self.config.bind_host.clone();
        let port = match self.config.bind_port {
            Some(port) => port,
            None => allocate_port(&host)?,
        };

        let mut process = ServerProcess::spawn(
            &self.config,
            &host,
            port,
            &workdir.data_path(),
            &workdir.logs_path(),
        )?;
        self.workdir = Some(workdir);

        let endpoint = Endpoint { host, port };
        let ready = probe::wait_until_ready(
            &mut process,
            &endpoint.http_url(),
            self.config.probe_interval,
            self.config.startup_timeout,
        )
        .await;

        // Stored either way; the caller kills it on the error path.
        self.process = Some(process);
        ready?;

        self.endpoint = Some(endpoint);
        Ok(())
    }

    /// Stop the server and release its resources.
    ///
    /// Sends a graceful termination signal, waits up to the configured
    /// grace period, then force-kills. After `stop()` returns the process
    /// is not running. An owned working directory is removed recursively;
    /// a caller-supplied one is left untouched, including the `data/` and
    /// `logs/` subdirectories the server wrote into.
    ///
    /// Idempotent and infallible: calling it when the server is not
    /// running is a no-op, and secondary teardown failures are logged and
    /// swallowed so cleanup code can call this blindly.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&mut self) {
        if self.state != ServerState::Running {
            tracing::debug!(state = ?self.state, "stop() outside Running is a no-op");
            return;
        }

        tracing::info!("Stopping Elasticsearch server");
        if let Some(process) = self.process.take() {
            tracing::debug!(node = %process.id(), "Terminating server process");
            process.terminate(self.config.shutdown_grace).await;
        }
        if let Some(workdir) = self.workdir.take() {
            workdir.cleanup();
        }
        self.endpoint = None;
        self.state = ServerState::Stopped;
        tracing::info!("Server stopped");
    }

    /// The `host:port` string of the running endpoint.
    ///
    /// Reports the pair that was actually bound, so an ephemeral-port
    /// allocation is observable. Valid only while the server is
    /// [`ServerState::Running`]; before `start()` or after `stop()` this
    /// fails with [`Error::InvalidState`] rather than returning a stale
    /// value that appears live.
    pub fn dsn(&self) -> Result<String> {
        self.endpoint().map(|endpoint| endpoint.to_string())
    }

    /// Structured form of [`ElasticsearchServer::dsn`], with the same
    /// state contract.
    pub fn endpoint(&self) -> Result<Endpoint> {
        if self.state != ServerState::Running {
            return Err(Error::InvalidState(format!(
                "Endpoint is only available while Running, but state is {:?}",
                self.state
            )));
        }
        self.endpoint.clone().ok_or_else(|| {
            Error::InvalidState("Running controller has no endpoint recorded".to_string())
        })
    }

    /// Run a block against a started server, stopping it on every exit
    /// path.
    ///
    /// Starts the server, hands the bound [`Endpoint`] to the closure,
    /// and calls [`ElasticsearchServer::stop`] unconditionally before
    /// returning the closure's result, whether it succeeded or failed.
    /// This is the primary intended usage pattern and carries the same
    /// guarantees as an explicit start/stop pair.
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self, f))]
    pub async fn scoped<T, F, Fut>(mut self, f: F) -> Result<T>
    where
        F: FnOnce(Endpoint) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.start().await?;
        let endpoint = match self.endpoint() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                self.stop().await;
                return Err(e);
            }
        };

        let result = f(endpoint).await;
        self.stop().await;
        result
    }
}

impl Default for ElasticsearchServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ElasticsearchServer {
    /// Best-effort safety net for controllers discarded while running:
    /// the child is killed (the kernel reaps it) and an owned working
    /// directory is removed when the handle drops. Primary correctness
    /// rests on explicit `stop()` or a scoped run, not on this guard.
    fn drop(&mut self) {
        if matches!(self.state, ServerState::Running | ServerState::Starting) {
            tracing::warn!(
                state = ?self.state,
                "Controller dropped without stop(); killing server process"
            );
            if let Some(mut process) = self.process.take() {
                process.abort();
            }
            // Dropping an owned WorkDir removes the temporary directory.
            self.workdir.take();
        }
    }
}

/// Choose an available ephemeral port by binding a throwaway socket to
/// port 0 and reading back the assigned port. Another process can claim
/// the port before the server binds it; that race is acceptable for a
/// test utility and surfaces as a bind failure.
fn allocate_port(host: &str) -> Result<u16> {
    let listener = TcpListener::bind((host, 0))
        .map_err(|e| Error::BindFailure(format!("Failed to bind {}:0: {}", host, e)))?;
    let port = listener
        .local_addr()
        .map_err(|e| Error::BindFailure(format!("Failed to read bound address: {}", e)))?
        .port();
    tracing::debug!(host, port, "Allocated ephemeral port");
    Ok(port)
}
