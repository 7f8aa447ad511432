use es_runner::config::Config;
use es_runner::error::{Error, Result};
use es_runner::{ElasticsearchServer, ServerState};
use std::path::Path;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Configuration pointing at the stub server script, which honours the
/// same -E command-line contract as the real elasticsearch entry point.
fn stub_config() -> Config {
    let script = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/stub_es.py");
    Config {
        command: "python3".to_string(),
        args: vec![script.to_string_lossy().into_owned()],
        startup_timeout: Duration::from_secs(10),
        probe_interval: Duration::from_millis(50),
        shutdown_grace: Duration::from_secs(5),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_lifecycle_with_temporary_directory() -> Result<()> {
    init_tracing();

    let mut server = ElasticsearchServer::with_config(stub_config());
    assert_eq!(server.state(), ServerState::Idle);
    assert!(server.workdir().is_none());

    server.start().await?;
    assert_eq!(server.state(), ServerState::Running);

    let workdir = server.workdir().expect("running server has a workdir").to_path_buf();
    assert!(workdir.is_dir());
    assert!(workdir.join("data").is_dir());
    assert!(workdir.join("logs").is_dir());

    // The endpoint answers as soon as start() has returned.
    let dsn = server.dsn()?;
    let endpoint = server.endpoint()?;
    assert_eq!(dsn, format!("{}:{}", endpoint.host(), endpoint.port()));

    let response = reqwest::get(endpoint.http_url()).await.expect("GET stub server");
    assert_eq!(response.status(), 200);

    server.stop().await;
    assert_eq!(server.state(), ServerState::Stopped);

    // The temporary directory is gone and the endpoint no longer answers.
    assert!(!workdir.exists());
    let err = reqwest::get(format!("http://{}", dsn))
        .await
        .expect_err("server should be gone");
    assert!(err.is_connect());

    // No stale endpoint after stop.
    assert!(matches!(server.dsn(), Err(Error::InvalidState(_))));

    Ok(())
}

#[tokio::test]
async fn test_existing_root_survives_teardown() -> Result<()> {
    init_tracing();

    let root = tempfile::Builder::new()
        .suffix("-testing-elastic")
        .tempdir()
        .expect("create caller-owned root");

    let config = Config {
        root: Some(root.path().to_path_buf()),
        ..stub_config()
    };

    let mut server = ElasticsearchServer::with_config(config);
    server.start().await?;

    let response = reqwest::get(server.endpoint()?.http_url())
        .await
        .expect("GET stub server");
    assert_eq!(response.status(), 200);

    server.stop().await;

    // The caller-supplied directory and the entries the server created in
    // it are left untouched.
    assert!(root.path().is_dir());
    assert!(root.path().join("data").is_dir());
    assert!(root.path().join("logs").is_dir());
    assert!(root.path().join("data").join("node.lock").is_file());

    Ok(())
}

#[tokio::test]
async fn test_scoped_run_tears_down_on_exit() -> Result<()> {
    init_tracing();

    let url = ElasticsearchServer::with_config(stub_config())
        .scoped(|endpoint| async move {
            let url = endpoint.http_url();
            let response = reqwest::get(&url).await.expect("GET stub server");
            assert_eq!(response.status(), 200);
            Ok(url)
        })
        .await?;

    // The same address raises a connection error once the scope has exited.
    let err = reqwest::get(&url).await.expect_err("server should be gone");
    assert!(err.is_connect());

    Ok(())
}

#[tokio::test]
async fn test_scoped_run_stops_on_block_error() -> Result<()> {
    init_tracing();

    let result: Result<()> = ElasticsearchServer::with_config(stub_config())
        .scoped(|endpoint| async move {
            let response = reqwest::get(endpoint.http_url()).await.expect("GET stub server");
            assert_eq!(response.status(), 200);
            Err(Error::Process(format!("test failure at {}", endpoint)))
        })
        .await;

    // The block's error propagates, after teardown has completed.
    assert!(matches!(result, Err(Error::Process(_))));

    Ok(())
}

#[tokio::test]
async fn test_dsn_requires_running_state() {
    let server = ElasticsearchServer::with_config(stub_config());
    assert!(matches!(server.dsn(), Err(Error::InvalidState(_))));
    assert!(matches!(server.endpoint(), Err(Error::InvalidState(_))));
}

#[tokio::test]
async fn test_stop_is_idempotent() -> Result<()> {
    init_tracing();

    // Without a prior start, stop is a no-op and the state stays Idle.
    let mut idle = ElasticsearchServer::with_config(stub_config());
    idle.stop().await;
    assert_eq!(idle.state(), ServerState::Idle);

    // After a full lifecycle, repeated stops stay in Stopped.
    let mut server = ElasticsearchServer::with_config(stub_config());
    server.start().await?;
    server.stop().await;
    server.stop().await;
    assert_eq!(server.state(), ServerState::Stopped);

    Ok(())
}

#[tokio::test]
async fn test_start_is_single_shot() -> Result<()> {
    init_tracing();

    let mut server = ElasticsearchServer::with_config(stub_config());
    server.start().await?;
    server.stop().await;

    // A stopped instance cannot be restarted.
    assert!(matches!(server.start().await, Err(Error::InvalidState(_))));
    assert_eq!(server.state(), ServerState::Stopped);

    Ok(())
}

#[tokio::test]
async fn test_startup_timeout_cleans_up() {
    init_tracing();

    let mut config = stub_config();
    config.startup_timeout = Duration::from_millis(1500);
    config
        .env
        .insert("STUB_ES_HANG".to_string(), "1".to_string());

    let mut server = ElasticsearchServer::with_config(config);
    let err = server.start().await.expect_err("stub never binds");

    assert!(matches!(err, Error::StartupTimeout(_)));
    assert_eq!(server.state(), ServerState::Stopped);
    // The partially-allocated working directory has been released.
    assert!(server.workdir().is_none());
    assert!(matches!(server.dsn(), Err(Error::InvalidState(_))));
}

#[tokio::test]
async fn test_early_child_exit_surfaces_bind_failure() {
    init_tracing();

    let mut config = stub_config();
    config
        .env
        .insert("STUB_ES_EXIT".to_string(), "1".to_string());

    let mut server = ElasticsearchServer::with_config(config);
    let err = server.start().await.expect_err("stub exits immediately");

    assert!(matches!(err, Error::BindFailure(_)));
    assert_eq!(server.state(), ServerState::Stopped);
}

#[tokio::test]
async fn test_missing_command_fails_start() {
    init_tracing();

    let config = Config {
        command: "es-runner-no-such-binary".to_string(),
        ..stub_config()
    };

    let mut server = ElasticsearchServer::with_config(config);
    let err = server.start().await.expect_err("command does not exist");

    assert!(matches!(err, Error::Process(_)));
    assert_eq!(server.state(), ServerState::Stopped);
}

#[tokio::test]
async fn test_ephemeral_ports_are_distinct() -> Result<()> {
    init_tracing();

    let mut first = ElasticsearchServer::with_config(stub_config());
    let mut second = ElasticsearchServer::with_config(stub_config());

    first.start().await?;
    second.start().await?;

    assert_ne!(first.dsn()?, second.dsn()?);

    first.stop().await;
    second.stop().await;

    Ok(())
}

#[tokio::test]
async fn test_explicit_port_is_used_verbatim() -> Result<()> {
    init_tracing();

    // Reserve a port the same way the controller would, then hand it over
    // explicitly.
    let port = {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind throwaway");
        listener.local_addr().expect("local addr").port()
    };

    let config = Config {
        bind_port: Some(port),
        ..stub_config()
    };

    let mut server = ElasticsearchServer::with_config(config);
    server.start().await?;

    assert_eq!(server.dsn()?, format!("127.0.0.1:{}", port));

    server.stop().await;
    Ok(())
}
