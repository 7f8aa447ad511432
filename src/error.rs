/// Error handling module for es-runner.
///
/// This module defines the error types used throughout the library.
/// Startup failures are surfaced to the caller so they can be handled;
/// teardown failures are absorbed internally and only logged, since
/// `stop()` must always be safe to call from cleanup code paths.
///
/// # Example
///
/// ```
/// use es_runner::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Server is ready"),
///         Err(Error::StartupTimeout(msg)) => println!("Server never became ready: {}", msg),
///         Err(Error::InvalidState(msg)) => println!("Operation out of order: {}", msg),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the es-runner library.
///
/// This enum represents all possible error types that can be returned from
/// operations in the library. Each variant includes context information to
/// help diagnose and handle the error appropriately.
#[derive(Error, Debug)]
pub enum Error {
    /// The readiness probe never succeeded within the startup timeout.
    ///
    /// This error occurs when:
    /// - The server binary is still initializing when the deadline elapses
    /// - The server bound a different address than the one it was given
    ///
    /// The partially-started child process is guaranteed to have been
    /// terminated before this error surfaces.
    #[error("Startup timeout: {0}")]
    StartupTimeout(String),

    /// The server process failed to bind its port or exited before it
    /// became ready.
    ///
    /// This error occurs when:
    /// - Another process claimed the port between allocation and bind
    /// - The server binary rejected its configuration and exited
    ///
    /// Carries the same cleanup guarantee as [`Error::StartupTimeout`].
    #[error("Bind failure: {0}")]
    BindFailure(String),

    /// An operation was invoked outside the state that supports it.
    ///
    /// This error occurs when:
    /// - `dsn()` is called before `start()` or after `stop()`
    /// - `start()` is called on an instance that has already run
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error when spawning or signalling the server process.
    ///
    /// This error occurs when:
    /// - The server command does not exist or is not executable
    /// - The operating system refuses to spawn the child
    #[error("Server process error: {0}")]
    Process(String),

    /// Error preparing the working directory for the server.
    ///
    /// This error occurs when:
    /// - The temporary directory cannot be allocated
    /// - The `data/` or `logs/` subdirectories cannot be created
    #[error("Working directory error: {0}")]
    WorkDir(String),

    /// Failed to parse configuration from a file or string.
    ///
    /// This error occurs when:
    /// - The configuration JSON is malformed
    /// - Field types are incorrect
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration is valid JSON but contains invalid values.
    ///
    /// This error occurs when:
    /// - The server command is empty
    /// - A timeout or interval is out of range
    /// - The supplied root path exists but is not a directory
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
}

/// Result type for es-runner operations.
///
/// This is a convenience type alias for `std::result::Result` with the `Error` type
/// from this module. Use this throughout the library and in client code to handle
/// errors in a consistent way.
pub type Result<T> = std::result::Result<T, Error>;
