use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

fn default_command() -> String {
    "elasticsearch".to_string()
}

fn default_java_opts() -> Option<String> {
    // Small heap; a transient test node does not need the production default.
    Some("-Xms256m -Xmx256m".to_string())
}

fn default_startup_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_probe_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(10)
}

/// Configuration for a transient Elasticsearch server instance.
///
/// This structure defines where the server keeps its on-disk state, which
/// address it binds, how it is launched, and how long the controller waits
/// during startup and shutdown. All fields have defaults suitable for a
/// single-node test instance, so `Config::default()` is a working
/// configuration whenever an `elasticsearch` entry point is on the `PATH`.
///
/// # Examples
///
/// Default configuration with an ephemeral port and a throwaway directory:
///
/// ```
/// use es_runner::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.bind_host, "127.0.0.1");
/// assert!(config.bind_port.is_none());
/// ```
///
/// Pinning the server to a caller-managed directory:
///
/// ```
/// use es_runner::config::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     root: Some(PathBuf::from("/tmp/es-node")),
///     ..Config::default()
/// };
/// assert!(config.root.is_some());
/// ```
///
/// # JSON Schema
///
/// Configurations can also be loaded from JSON:
///
/// ```json
/// {
///   "bindHost": "127.0.0.1",
///   "command": "/opt/elasticsearch/bin/elasticsearch",
///   "startupTimeout": "45s",
///   "probeInterval": "250ms",
///   "env": {
///     "ES_LOG_STYLE": "console"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root working directory for the server's `data/` and `logs/`
    /// subdirectories. When `None`, a uniquely-named temporary directory is
    /// allocated at start time and removed again at stop time. When set,
    /// the directory is used as-is and never deleted by the controller.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Host the server is told to listen on. Defaults to loopback.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// Port the server is told to listen on. When `None`, an available
    /// ephemeral port is chosen at start time.
    #[serde(default)]
    pub bind_port: Option<u16>,

    /// Command to execute when starting the server.
    /// This can be an absolute path or a command available in the PATH.
    #[serde(default = "default_command")]
    pub command: String,

    /// Extra command-line arguments passed before the generated
    /// `-E` settings, e.g. for wrapper scripts.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables to set when launching the server.
    /// These will be combined with the current environment.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// JVM options exported as `ES_JAVA_OPTS`. Defaults to a small test
    /// heap; set to `None` to inherit whatever the environment provides.
    #[serde(default = "default_java_opts")]
    pub java_opts: Option<String>,

    /// Upper bound on the time `start()` waits for the server to answer
    /// its readiness probe.
    #[serde(default = "default_startup_timeout", with = "humantime_serde")]
    pub startup_timeout: Duration,

    /// Pause between consecutive readiness probes.
    #[serde(default = "default_probe_interval", with = "humantime_serde")]
    pub probe_interval: Duration,

    /// Time the server is given to exit after a graceful termination
    /// signal before it is force-killed.
    #[serde(default = "default_shutdown_grace", with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            bind_host: default_bind_host(),
            bind_port: None,
            command: default_command(),
            args: Vec::new(),
            env: HashMap::new(),
            java_opts: default_java_opts(),
            startup_timeout: default_startup_timeout(),
            probe_interval: default_probe_interval(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl Config {
    /// Loads a configuration from a file path.
    ///
    /// This method reads the file at the specified path and parses its contents
    /// as a JSON configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the configuration file
    ///
    /// # Returns
    ///
    /// A `Result<Config>` that contains the parsed configuration or an error
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be read
    /// * The file contents are not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        Self::parse_from_str(&content)
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Arguments
    ///
    /// * `content` - A string containing JSON configuration
    ///
    /// # Returns
    ///
    /// A `Result<Config>` that contains the parsed configuration or an error
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The string is not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }
}
