use es_runner::config::{Config, validate_config};
use es_runner::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_parse_config() -> Result<()> {
    let config_str = r#"{
        "root": "/var/tmp/es-node",
        "bindHost": "0.0.0.0",
        "bindPort": 9201,
        "command": "/opt/elasticsearch/bin/elasticsearch",
        "args": ["--silent"],
        "env": {
            "ES_LOG_STYLE": "console"
        },
        "javaOpts": "-Xms512m -Xmx512m",
        "startupTimeout": "45s",
        "probeInterval": "250ms",
        "shutdownGrace": "5s"
    }"#;

    let config = Config::parse_from_str(config_str)?;

    assert_eq!(config.root, Some(PathBuf::from("/var/tmp/es-node")));
    assert_eq!(config.bind_host, "0.0.0.0");
    assert_eq!(config.bind_port, Some(9201));
    assert_eq!(config.command, "/opt/elasticsearch/bin/elasticsearch");
    assert_eq!(config.args, vec!["--silent"]);
    assert_eq!(
        config.env.get("ES_LOG_STYLE"),
        Some(&"console".to_string())
    );
    assert_eq!(config.java_opts, Some("-Xms512m -Xmx512m".to_string()));
    assert_eq!(config.startup_timeout, Duration::from_secs(45));
    assert_eq!(config.probe_interval, Duration::from_millis(250));
    assert_eq!(config.shutdown_grace, Duration::from_secs(5));

    Ok(())
}

#[test]
fn test_parse_config_defaults() -> Result<()> {
    let config = Config::parse_from_str("{}")?;

    assert!(config.root.is_none());
    assert_eq!(config.bind_host, "127.0.0.1");
    assert!(config.bind_port.is_none());
    assert_eq!(config.command, "elasticsearch");
    assert!(config.args.is_empty());
    assert!(config.env.is_empty());
    assert_eq!(config.java_opts, Some("-Xms256m -Xmx256m".to_string()));

    Ok(())
}

#[test]
fn test_parse_config_rejects_malformed_json() {
    let result = Config::parse_from_str("{\"bindPort\": \"not-a-port\"}");
    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_validate_config() -> Result<()> {
    // The defaults validate cleanly.
    validate_config(&Config::default())?;

    // Empty command is invalid.
    let invalid = Config {
        command: String::new(),
        ..Config::default()
    };
    assert!(matches!(
        validate_config(&invalid),
        Err(Error::ConfigInvalid(_))
    ));

    // Explicit port 0 is invalid; omit the port instead.
    let invalid = Config {
        bind_port: Some(0),
        ..Config::default()
    };
    assert!(matches!(
        validate_config(&invalid),
        Err(Error::ConfigInvalid(_))
    ));

    // The probe interval must leave room for more than one attempt.
    let invalid = Config {
        startup_timeout: Duration::from_millis(100),
        probe_interval: Duration::from_millis(100),
        ..Config::default()
    };
    assert!(matches!(
        validate_config(&invalid),
        Err(Error::ConfigInvalid(_))
    ));

    // A zero grace period would make stop() skip the graceful path.
    let invalid = Config {
        shutdown_grace: Duration::ZERO,
        ..Config::default()
    };
    assert!(matches!(
        validate_config(&invalid),
        Err(Error::ConfigInvalid(_))
    ));

    Ok(())
}

#[test]
fn test_validate_config_rejects_file_root() -> Result<()> {
    let file = tempfile::NamedTempFile::new().expect("create temp file");

    let invalid = Config {
        root: Some(file.path().to_path_buf()),
        ..Config::default()
    };
    assert!(matches!(
        validate_config(&invalid),
        Err(Error::ConfigInvalid(_))
    ));

    Ok(())
}
