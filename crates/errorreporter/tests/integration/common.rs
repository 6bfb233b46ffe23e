//! Shared test helpers
//!
//! Provides a wiremock collection endpoint and sample errors with cause chains.

use thiserror::Error;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use errorreporter::Reporter;

pub const USER: &str = "SegganBot";
pub const REPO: &str = "Test";
pub const VERSION: &str = "1.4.2";

/// An error with a one-level cause chain.
#[derive(Debug, Error)]
#[error("failed to load settings")]
pub struct LoadError {
    #[source]
    pub source: std::io::Error,
}

pub fn load_error() -> LoadError {
    LoadError {
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
    }
}

/// Trace text `load_error()` renders to.
pub const LOAD_ERROR_TRACE: &str = "failed to load settings\n\nCaused by:\n    0: permission denied";

/// Starts a collection endpoint answering every POST with `status`, expecting `calls` requests.
///
/// Expectations are verified when the returned server is dropped.
pub async fn setup_collector(status: u16, calls: u64) -> (MockServer, Reporter) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(status))
        .expect(calls)
        .mount(&server)
        .await;

    let reporter = Reporter::with_fixed_version(USER, REPO, VERSION)
        .expect("failed to build reporter")
        .with_endpoint(server.uri());

    (server, reporter)
}

/// Bodies of all requests the server received, parsed as JSON.
pub async fn received_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .expect("request recording disabled")
        .iter()
        .map(|req| serde_json::from_slice(&req.body).expect("body is not JSON"))
        .collect()
}
