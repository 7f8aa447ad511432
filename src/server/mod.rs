/// Server management module for es-runner.
///
/// This module handles the mechanics behind the [`crate::ElasticsearchServer`]
/// controller: spawning and terminating the server child process, probing it
/// for readiness, and tracking ownership of its on-disk working directory.
///
/// # Components
///
/// * `process` - Core process management for the server child
/// * `probe` - Readiness polling against the server's HTTP endpoint
/// * `workdir` - Working-directory allocation and ownership rules
pub(crate) mod probe;
mod process;
pub(crate) mod workdir;

pub use process::{InstanceId, ServerState};
pub(crate) use process::ServerProcess;
