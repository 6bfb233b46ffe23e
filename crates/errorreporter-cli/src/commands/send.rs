//! Send and preview commands
//!
//! Provides the `errorreporter send` and `errorreporter preview` commands.
//! Both build an error chain from `--message` and repeated `--cause` flags;
//! `send` submits it, `preview` prints the payload without any network call.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Args;
use errorreporter::{ReportPayload, Reporter, ReporterConfig};
use thiserror::Error;
use tracing::{debug, info};

use crate::output::{Output, OutputFormat};

/// Error built from command-line messages, one link per message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ChainedError {
    message: String,
    #[source]
    source: Option<Box<ChainedError>>,
}

impl ChainedError {
    /// Builds a chain from messages, outermost first.
    pub fn from_messages<I, S>(messages: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: DoubleEndedIterator,
        S: Into<String>,
    {
        messages.into_iter().rev().fold(None, |source, message| {
            Some(Self {
                message: message.into(),
                source: source.map(Box::new),
            })
        })
    }
}

/// Arguments shared by `send` and `preview`
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Error message
    #[arg(short, long)]
    message: String,

    /// Cause of the error, outermost first (repeatable)
    #[arg(short, long = "cause")]
    causes: Vec<String>,

    /// Application version to report
    #[arg(long, default_value = "unknown")]
    app_version: String,

    /// Repository owner (overrides config)
    #[arg(long)]
    user: Option<String>,

    /// Repository name (overrides config)
    #[arg(long)]
    repo: Option<String>,

    /// Collection endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,
}

impl ReportArgs {
    /// Loads the config file (if any) and applies command-line overrides.
    pub fn resolve_config(&self, config_path: Option<&Path>) -> Result<ReporterConfig> {
        let mut config = match config_path {
            Some(path) => ReporterConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => {
                let path = ReporterConfig::default_path();
                if path.exists() {
                    ReporterConfig::load(&path)
                        .with_context(|| format!("Failed to load config from {}", path.display()))?
                } else {
                    ReporterConfig::new(String::new(), String::new())
                }
            }
        };

        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(repo) = &self.repo {
            config.repo = repo.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!("Invalid configuration: {}", messages.join("; "));
        }

        Ok(config)
    }

    pub fn error(&self) -> ChainedError {
        let messages = std::iter::once(&self.message).chain(&self.causes).cloned();
        ChainedError::from_messages(messages.collect::<Vec<_>>()).unwrap_or(ChainedError {
            message: self.message.clone(),
            source: None,
        })
    }

    fn reporter(&self, config: &ReporterConfig) -> Result<Reporter> {
        let version = self.app_version.clone();
        Reporter::from_config(config, move || version.clone()).context("Failed to create reporter")
    }
}

/// `errorreporter send`
#[derive(Debug, Args)]
pub struct SendCommand {
    #[command(flatten)]
    args: ReportArgs,
}

impl SendCommand {
    pub async fn execute(&self, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
        let output = Output::new(format);
        let config = self.args.resolve_config(config_path)?;
        let reporter = self.args.reporter(&config)?;

        info!(user = %config.user, repo = %config.repo, endpoint = %config.endpoint, "Sending error report");

        // main prints the returned error
        let outcome = reporter
            .report(self.args.error(), false)
            .await
            .context("Failed to submit error report")?;
        output.outcome(outcome);
        Ok(())
    }
}

/// `errorreporter preview`
#[derive(Debug, Args)]
pub struct PreviewCommand {
    #[command(flatten)]
    args: ReportArgs,
}

impl PreviewCommand {
    pub async fn execute(&self, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
        let output = Output::new(format);
        let config = self.args.resolve_config(config_path)?;

        // Runs after the configured hooks, so it sees what would be sent
        let captured: Arc<Mutex<Option<ReportPayload>>> = Arc::default();
        let slot = Arc::clone(&captured);
        let reporter = self
            .args
            .reporter(&config)?
            .with_enabled(true)
            .with_pre_send(move |payload: &mut ReportPayload| {
                if let Ok(mut slot) = slot.lock() {
                    *slot = Some(payload.clone());
                }
                true
            });

        let outcome = reporter.submit(&self.args.error()).await?;
        debug!(?outcome, "Preview finished");

        let payload = captured.lock().ok().and_then(|mut slot| slot.take());
        match payload {
            Some(payload) => print_payload(&output, &payload),
            None => {
                output.warn("Report would be suppressed by a pre-send filter");
                Ok(())
            }
        }
    }
}

fn print_payload(output: &Output, payload: &ReportPayload) -> Result<()> {
    if output.is_json() {
        let value = serde_json::to_value(payload).context("Failed to encode payload")?;
        output.print_json(&value);
        return Ok(());
    }

    output.success("Payload preview (not sent)");
    output.info(&format!("Version:  {}", payload.version()));
    output.info(&format!("Hashcode: {}", payload.hashcode()));
    output.info("Error:");
    for line in payload.error().lines() {
        output.info(&format!("  {line}"));
    }
    Ok(())
}
