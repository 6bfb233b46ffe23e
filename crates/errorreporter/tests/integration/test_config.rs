//! Integration tests for Reporter::from_config
//!
//! Loads YAML from disk and checks that the configured endpoint, status
//! table and built-in hooks are honoured on the wire.

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use errorreporter::{ReportOutcome, Reporter, ReporterConfig};

use crate::common::load_error;

async fn mock_status(status: u16, calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status))
        .expect(calls)
        .mount(&server)
        .await;
    server
}

fn write_config(dir: &tempfile::TempDir, yaml: &str) -> ReporterConfig {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    ReporterConfig::load(&path).expect("failed to load config")
}

#[tokio::test]
async fn test_config_endpoint_and_identifiers() {
    let server = mock_status(200, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &format!("user: alice\nrepo: app\nendpoint: {}\n", server.uri()));
    assert!(config.validate().is_empty());

    let reporter = Reporter::from_config(&config, || "3.0".to_string()).unwrap();
    assert_eq!(
        reporter.report(load_error(), false).await.unwrap(),
        ReportOutcome::Sent
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].headers.get("user").unwrap(), "alice");
    assert_eq!(requests[0].headers.get("repo").unwrap(), "app");
}

#[tokio::test]
async fn test_config_disabled() {
    let server = mock_status(200, 0).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        &format!("user: alice\nrepo: app\nenabled: false\nendpoint: {}\n", server.uri()),
    );

    let reporter = Reporter::from_config(&config, || "3.0".to_string()).unwrap();
    assert_eq!(
        reporter.report(load_error(), false).await.unwrap(),
        ReportOutcome::Disabled
    );
}

#[tokio::test]
async fn test_config_status_table_replaces_defaults() {
    let server = mock_status(429, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let yaml = format!(
        "user: alice\nrepo: app\nendpoint: {}\nstatus_reasons:\n  429: Rate limited\n",
        server.uri()
    );
    let config = write_config(&dir, &yaml);

    let reporter = Reporter::from_config(&config, || "3.0".to_string()).unwrap();
    let err = reporter.report(load_error(), false).await.unwrap_err();
    assert_eq!(err.failure().unwrap().reason(), "Rate limited");
}

#[tokio::test]
async fn test_config_skip_transient() {
    let server = mock_status(200, 0).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        &format!("user: alice\nrepo: app\nskip_transient: true\nendpoint: {}\n", server.uri()),
    );

    let reporter = Reporter::from_config(&config, || "3.0".to_string()).unwrap();
    let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    assert_eq!(
        reporter.report(err, false).await.unwrap(),
        ReportOutcome::Suppressed
    );
}
