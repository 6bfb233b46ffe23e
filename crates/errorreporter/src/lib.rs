//! ErrorReporter - Forward application errors to a remote issue tracker
//!
//! Provides:
//! - `Reporter`: Builds, filters and submits error reports
//! - `ReportPayload`: The JSON document sent for each report
//! - `PreSendHook`: Inspect, rewrite or suppress payloads before sending
//! - `StatusPolicy`: Which response statuses count as reporting failures
//! - `ReporterConfig`: YAML-backed configuration
//! - `ReportFailure` / `ReportError`: Reporting failures and rethrown errors

pub mod config;
pub mod error;
pub mod hooks;
pub mod payload;
pub mod reporter;
pub mod status;
pub mod trace;

pub use config::{RedactConfig, ReporterConfig, ValidationError, DEFAULT_ENDPOINT};
pub use error::{ReportError, ReportFailure};
pub use hooks::{HookChain, PreSendHook, Redactor, TransientFilter};
pub use payload::ReportPayload;
pub use reporter::{ReportOutcome, Reporter, VersionProvider};
pub use status::StatusPolicy;
