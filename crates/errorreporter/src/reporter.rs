//! Error reporter
//!
//! Builds a payload from an error, runs the pre-send hook, POSTs the payload
//! to the collection endpoint and classifies the response.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use errorreporter::Reporter;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let reporter = Reporter::new("SegganBot", "my-app", || env!("CARGO_PKG_VERSION").to_string())?;
//!
//! if let Err(e) = std::fs::read_to_string("settings.yaml") {
//!     // Report and keep going
//!     reporter.report(e, false).await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::error::Error;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{ReporterConfig, DEFAULT_ENDPOINT};
use crate::error::{ReportError, ReportFailure};
use crate::hooks::{HookChain, PreSendHook, Redactor, TransientFilter};
use crate::payload::ReportPayload;
use crate::status::StatusPolicy;
use crate::trace;

/// Fixed `User-Agent` sent with every report
const USER_AGENT_VALUE: &str = "Mozilla/5.0 ErrorReporter (errorreporter-rs)";

/// Wire protocol version, sent in the `Version` header
const PROTOCOL_VERSION: &str = "1";

/// Zero-argument function returning the current application version
pub type VersionProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// How a report call completed without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The payload was submitted and the endpoint accepted it
    Sent,
    /// The reporter is turned off; nothing was built or sent
    Disabled,
    /// The pre-send hook suppressed the payload
    Suppressed,
}

/// Result of the synchronous half of a report
enum Prepared {
    Skip(ReportOutcome),
    Deliver(ReportPayload),
}

/// Reports errors to a remote collection endpoint.
///
/// Construct once and share (`&Reporter` or `Arc<Reporter>`); every call is
/// independent. The only runtime-mutable state is the enabled flag.
pub struct Reporter {
    /// HTTP client with connection pooling disabled
    client: Client,
    /// Collection endpoint URL
    endpoint: String,
    /// `User` header value
    user: HeaderValue,
    /// `Repo` header value
    repo: HeaderValue,
    /// Called once per report
    version: VersionProvider,
    /// Instance-local on/off switch
    enabled: AtomicBool,
    /// Pre-send hooks, run in order; empty means send everything
    hooks: HookChain,
    /// Which response statuses count as failures
    status_policy: StatusPolicy,
}

impl Reporter {
    /// Creates a reporter that asks `version` for the application version on every report.
    ///
    /// # Arguments
    /// * `user` - Owner of the repository issues are filed against
    /// * `repo` - Repository issues are filed against
    /// * `version` - Version provider, invoked once per report
    pub fn new<F>(
        user: impl Into<String>,
        repo: impl Into<String>,
        version: F,
    ) -> Result<Self, ReportFailure>
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Ok(Self {
            client: build_client()?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user: header_value("User", user.into())?,
            repo: header_value("Repo", repo.into())?,
            version: Arc::new(version),
            enabled: AtomicBool::new(true),
            hooks: HookChain::new(),
            status_policy: StatusPolicy::default(),
        })
    }

    /// Creates a reporter with a constant application version.
    pub fn with_fixed_version(
        user: impl Into<String>,
        repo: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, ReportFailure> {
        let version = version.into();
        Self::new(user, repo, move || version.clone())
    }

    /// Creates a reporter from configuration.
    ///
    /// Applies the endpoint, enabled flag and status table, and installs the
    /// built-in transient filter and redactor when configured (in that order,
    /// so transient errors are recognised before redaction).
    pub fn from_config<F>(config: &ReporterConfig, version: F) -> Result<Self, ReportFailure>
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        let mut reporter = Self::new(config.user.clone(), config.repo.clone(), version)?
            .with_endpoint(config.endpoint.clone())
            .with_enabled(config.enabled);

        if let Some(reasons) = &config.status_reasons {
            reporter.status_policy = StatusPolicy::new(reasons.clone());
        }
        if config.skip_transient {
            reporter.hooks.push(TransientFilter);
        }
        if config.redact.is_active() {
            reporter.hooks.push(Redactor::new(&config.redact));
        }

        debug!(
            endpoint = %reporter.endpoint,
            hooks = reporter.hooks.len(),
            enabled = config.enabled,
            "Reporter configured"
        );
        Ok(reporter)
    }

    /// Appends a pre-send hook. Hooks run in the order they were added.
    pub fn with_pre_send(mut self, hook: impl PreSendHook + 'static) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Removes all pre-send hooks, including built-in ones.
    pub fn without_pre_send(mut self) -> Self {
        self.hooks = HookChain::new();
        self
    }

    /// Sends reports to `endpoint` instead of the default collector (useful for testing).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Replaces the status-code failure table.
    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    /// Turns reporting on or off for this instance.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        debug!(enabled, "Reporter toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn status_policy(&self) -> &StatusPolicy {
        &self.status_policy
    }

    /// Builds the payload for `error` without running hooks or sending.
    pub fn payload_for(&self, error: &(dyn Error + 'static)) -> ReportPayload {
        let trace = trace::render(error);
        ReportPayload::new(&trace, (self.version)())
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Reports `error` and optionally hands it back.
    ///
    /// With `rethrow == false` the result is `Ok(outcome)` or
    /// `Err(ReportError::Failed(..))`. With `rethrow == true` the result is
    /// always `Err(ReportError::Rethrown { error, failure })`, where `failure`
    /// holds the reporting failure, if any. The original error always wins.
    pub async fn report<E>(&self, error: E, rethrow: bool) -> Result<ReportOutcome, ReportError<E>>
    where
        E: Error + 'static,
    {
        let result = self.submit(&error).await;

        if rethrow {
            let failure = result.err();
            if let Some(failure) = &failure {
                warn!(error = %failure, "Report failed; rethrowing original error");
            }
            return Err(ReportError::Rethrown { error, failure });
        }

        result.map_err(ReportError::Failed)
    }

    /// Reports `error` and hands it back: `report(error, true)`.
    ///
    /// ```rust,no_run
    /// # use errorreporter::{Reporter, ReportError};
    /// # async fn load(reporter: &Reporter) -> Result<String, ReportError<std::io::Error>> {
    /// match std::fs::read_to_string("settings.yaml") {
    ///     Ok(s) => Ok(s),
    ///     Err(e) => Err(reporter.report_and_rethrow(e).await),
    /// }
    /// # }
    /// ```
    pub async fn report_and_rethrow<E>(&self, error: E) -> ReportError<E>
    where
        E: Error + 'static,
    {
        let failure = self.submit(&error).await.err();
        if let Some(failure) = &failure {
            warn!(error = %failure, "Report failed; rethrowing original error");
        }
        ReportError::Rethrown { error, failure }
    }

    /// Reports an error the caller keeps ownership of.
    ///
    /// Runs every reporting step but never rethrows. Works for anything that
    /// derefs to `dyn Error`, including `anyhow::Error` (`&*err`).
    pub fn submit<'a>(
        &'a self,
        error: &(dyn Error + 'static),
    ) -> impl Future<Output = Result<ReportOutcome, ReportFailure>> + Send + 'a {
        let prepared = self.prepare(|| trace::render(error));
        self.finish(prepared)
    }

    /// Reports an `anyhow::Error`, including its backtrace when one was captured.
    ///
    /// Same as `submit(&*err)` except that the frames recorded by `anyhow`
    /// are appended to the trace. The hashcode is computed without them.
    pub fn submit_anyhow<'a>(
        &'a self,
        error: &anyhow::Error,
    ) -> impl Future<Output = Result<ReportOutcome, ReportFailure>> + Send + 'a {
        let prepared = self.prepare(|| trace::render_with_backtrace(&**error, error.backtrace()));
        self.finish(prepared)
    }

    /// Runs `action`; if it fails, reports the error.
    ///
    /// Returns `Ok(Some(value))` on success without any network activity,
    /// `Ok(None)` if the error was reported and not rethrown.
    pub async fn run_or_report<T, E, F>(
        &self,
        action: F,
        rethrow: bool,
    ) -> Result<Option<T>, ReportError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: Error + 'static,
    {
        match action() {
            Ok(value) => Ok(Some(value)),
            Err(error) => self.report(error, rethrow).await.map(|_| None),
        }
    }

    /// `run_or_report(action, true)`: the value on success, the original error otherwise.
    pub async fn run_or_report_and_rethrow<T, E, F>(&self, action: F) -> Result<T, ReportError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: Error + 'static,
    {
        match action() {
            Ok(value) => Ok(value),
            Err(error) => Err(self.report_and_rethrow(error).await),
        }
    }

    /// Awaits `future`; if it fails, reports the error.
    pub async fn run_or_report_async<T, E, Fut>(
        &self,
        future: Fut,
        rethrow: bool,
    ) -> Result<Option<T>, ReportError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        match future.await {
            Ok(value) => Ok(Some(value)),
            Err(error) => self.report(error, rethrow).await.map(|_| None),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Everything up to the network call. Kept synchronous so the returned
    /// future does not hold the borrowed error.
    fn prepare(&self, render: impl FnOnce() -> String) -> Prepared {
        if !self.is_enabled() {
            debug!("Reporter disabled, skipping report");
            return Prepared::Skip(ReportOutcome::Disabled);
        }

        let mut payload = ReportPayload::new(&render(), (self.version)());
        debug!(hashcode = %payload.hashcode(), version = %payload.version(), "Built error report");

        if self.hooks.suppress(&mut payload) {
            debug!(hashcode = %payload.hashcode(), "Report suppressed by pre-send hook");
            return Prepared::Skip(ReportOutcome::Suppressed);
        }

        Prepared::Deliver(payload)
    }

    fn finish(
        &self,
        prepared: Prepared,
    ) -> impl Future<Output = Result<ReportOutcome, ReportFailure>> + Send + '_ {
        async move {
            match prepared {
                Prepared::Skip(outcome) => Ok(outcome),
                Prepared::Deliver(payload) => {
                    self.deliver(&payload).await?;
                    Ok(ReportOutcome::Sent)
                }
            }
        }
    }

    /// POST the payload and classify the response status.
    async fn deliver(&self, payload: &ReportPayload) -> Result<(), ReportFailure> {
        let body = payload.to_json().map_err(|e| {
            warn!(error = %e, hashcode = %payload.hashcode(), "Failed to encode error report");
            e
        })?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header("User", self.user.clone())
            .header("Repo", self.repo.clone())
            .header("Version", PROTOCOL_VERSION)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, endpoint = %self.endpoint, "Failed to submit error report");
                ReportFailure::Transport(e)
            })?;

        let status = response.status().as_u16();
        // The body carries nothing we need
        drop(response);

        if let Err(failure) = self.status_policy.check(status) {
            warn!(status, reason = %failure, "Collection endpoint rejected error report");
            return Err(failure);
        }

        info!(status, hashcode = %payload.hashcode(), "Error report submitted");
        Ok(())
    }
}

/// One fresh connection per report: no idle connections are kept.
fn build_client() -> Result<Client, ReportFailure> {
    Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .map_err(ReportFailure::Client)
}

fn header_value(header: &'static str, value: String) -> Result<HeaderValue, ReportFailure> {
    HeaderValue::from_str(&value).map_err(|_| ReportFailure::InvalidHeader { header, value })
}
