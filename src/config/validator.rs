use crate::config::Config;
use crate::error::{Error, Result};

/// Validates the launch portion of a configuration
pub fn validate_launch_config(config: &Config) -> Result<()> {
    // Check command is not empty
    if config.command.is_empty() {
        return Err(Error::ConfigInvalid("Server command is empty".to_string()));
    }

    if config.bind_host.is_empty() {
        return Err(Error::ConfigInvalid("Bind host is empty".to_string()));
    }

    // Port 0 is the kernel's "pick one" sentinel; callers who want that
    // behaviour should leave the port unset instead.
    if config.bind_port == Some(0) {
        return Err(Error::ConfigInvalid(
            "Explicit port 0 is not allowed; omit the port to allocate an ephemeral one"
                .to_string(),
        ));
    }

    if let Some(root) = &config.root {
        if root.exists() && !root.is_dir() {
            return Err(Error::ConfigInvalid(format!(
                "Root path '{}' exists but is not a directory",
                root.display()
            )));
        }
    }

    Ok(())
}

/// Validates the timing portion of a configuration
pub fn validate_timing_config(config: &Config) -> Result<()> {
    if config.startup_timeout.is_zero() {
        return Err(Error::ConfigInvalid(
            "Startup timeout must be non-zero".to_string(),
        ));
    }

    if config.probe_interval.is_zero() {
        return Err(Error::ConfigInvalid(
            "Probe interval must be non-zero".to_string(),
        ));
    }

    if config.probe_interval >= config.startup_timeout {
        return Err(Error::ConfigInvalid(
            "Probe interval must be shorter than the startup timeout".to_string(),
        ));
    }

    if config.shutdown_grace.is_zero() {
        return Err(Error::ConfigInvalid(
            "Shutdown grace period must be non-zero".to_string(),
        ));
    }

    Ok(())
}

/// Full configuration validation
pub fn validate_config(config: &Config) -> Result<()> {
    validate_launch_config(config)?;
    validate_timing_config(config)?;

    Ok(())
}
