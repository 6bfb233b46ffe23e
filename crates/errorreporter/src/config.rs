//! Reporter configuration.
//!
//! Typed configuration that maps to an optional YAML file, with loading,
//! validation and defaults. The version provider and custom hooks are code
//! and are handed to [`Reporter::from_config`] separately.
//!
//! ```yaml
//! user: SegganBot
//! repo: my-app
//! enabled: true
//! redact:
//!   strip_paths: true
//! skip_transient: true
//! status_reasons:
//!   429: Rate limited
//! ```
//!
//! [`Reporter::from_config`]: crate::reporter::Reporter::from_config

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};

/// Default collection endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://error-reports.seggan.workers.dev";

/// Top-level reporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Owner of the repository issues are filed against.
    pub user: String,
    /// Repository issues are filed against.
    pub repo: String,
    /// When false, reports are skipped entirely.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Collection endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Replaces the default status-code failure table when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reasons: Option<BTreeMap<u16, String>>,
    /// Built-in redaction of traces before sending.
    #[serde(default)]
    pub redact: RedactConfig,
    /// Suppress timeouts, refused connections and rate limiting.
    #[serde(default)]
    pub skip_transient: bool,
}

/// Which kinds of personal information to strip from traces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactConfig {
    /// Replace the home directory with `<HOME>`.
    pub strip_paths: bool,
    /// Replace the login name with `<USER>`.
    pub strip_usernames: bool,
    /// Replace file basenames with `<FILE>.ext`.
    pub strip_filenames: bool,
}

impl RedactConfig {
    /// Returns true if any redaction is turned on.
    pub fn is_active(&self) -> bool {
        self.strip_paths || self.strip_usernames || self.strip_filenames
    }
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl ReporterConfig {
    /// Minimal configuration: defaults for everything but the identifiers.
    pub fn new(user: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            repo: repo.into(),
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            status_reasons: None,
            redact: RedactConfig::default(),
            skip_transient: false,
        }
    }

    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReporterConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/errorreporter/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("errorreporter")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending field, e.g. `"endpoint"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ReporterConfig {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (field, value) in [("user", &self.user), ("repo", &self.repo)] {
            if value.trim().is_empty() {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "must not be empty".into(),
                });
            } else if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "contains characters not allowed in an HTTP header".into(),
                });
            }
        }

        match url::Url::parse(&self.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError {
                field: "endpoint".into(),
                message: format!("unsupported scheme '{}'; expected http or https", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError {
                field: "endpoint".into(),
                message: format!("invalid URL: {e}"),
            }),
        }

        if let Some(reasons) = &self.status_reasons {
            for (code, reason) in reasons {
                if !(400..=599).contains(code) {
                    errors.push(ValidationError {
                        field: format!("status_reasons.{code}"),
                        message: "must be an HTTP error status (400..=599)".into(),
                    });
                }
                if reason.trim().is_empty() {
                    errors.push(ValidationError {
                        field: format!("status_reasons.{code}"),
                        message: "reason must not be empty".into(),
                    });
                }
            }
        }

        errors
    }
}
