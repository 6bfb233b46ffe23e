//! Integration tests for guarded execution
//!
//! `run_or_report` must stay silent when the action succeeds and forward the
//! error with the caller's rethrow flag when it fails.

use errorreporter::ReportOutcome;

use crate::common::{self, load_error, LoadError};

#[tokio::test]
async fn test_successful_action_makes_no_request() {
    let (_server, reporter) = common::setup_collector(200, 0).await;

    let result = reporter
        .run_or_report(|| Ok::<_, LoadError>(42), true)
        .await
        .unwrap();
    assert_eq!(result, Some(42));
}

#[tokio::test]
async fn test_failing_action_is_reported() {
    let (server, reporter) = common::setup_collector(200, 1).await;

    let result = reporter
        .run_or_report(|| Err::<(), _>(load_error()), false)
        .await
        .unwrap();
    assert_eq!(result, None);

    let bodies = common::received_bodies(&server).await;
    assert_eq!(
        bodies[0]["Error"],
        format!("```\n{}\n```", common::LOAD_ERROR_TRACE)
    );
}

#[tokio::test]
async fn test_failing_action_is_rethrown() {
    let (_server, reporter) = common::setup_collector(200, 1).await;

    let err = reporter
        .run_or_report(|| Err::<(), _>(load_error()), true)
        .await
        .unwrap_err();
    assert!(err.is_rethrown());
    assert_eq!(err.to_string(), "failed to load settings");
}

#[tokio::test]
async fn test_reporting_failure_surfaces_without_rethrow() {
    let (_server, reporter) = common::setup_collector(410, 1).await;

    let err = reporter
        .run_or_report(|| Err::<(), _>(load_error()), false)
        .await
        .unwrap_err();
    assert!(!err.is_rethrown());
    assert_eq!(
        err.failure().map(|f| f.reason()),
        Some("Repository has issues disabled".to_string())
    );
}

#[tokio::test]
async fn test_run_or_report_and_rethrow() {
    let (_server, reporter) = common::setup_collector(200, 1).await;

    let value = reporter
        .run_or_report_and_rethrow(|| Ok::<_, LoadError>("ok"))
        .await
        .unwrap();
    assert_eq!(value, "ok");

    let err = reporter
        .run_or_report_and_rethrow(|| Err::<(), _>(load_error()))
        .await
        .unwrap_err();
    assert!(err.original().is_some());
}

#[tokio::test]
async fn test_async_action() {
    let (_server, reporter) = common::setup_collector(200, 1).await;

    let ok = reporter
        .run_or_report_async(async { Ok::<_, LoadError>("done") }, false)
        .await
        .unwrap();
    assert_eq!(ok, Some("done"));

    let reported = reporter
        .run_or_report_async(async { Err::<(), _>(load_error()) }, false)
        .await
        .unwrap();
    assert_eq!(reported, None);
}

#[tokio::test]
async fn test_disabled_reporter_with_failing_action() {
    let (_server, reporter) = common::setup_collector(200, 0).await;
    reporter.set_enabled(false);

    let result = reporter
        .run_or_report(|| Err::<(), _>(load_error()), false)
        .await;
    assert!(matches!(result, Ok(None)));

    let outcome = reporter.submit(&load_error()).await.unwrap();
    assert_eq!(outcome, ReportOutcome::Disabled);
}
