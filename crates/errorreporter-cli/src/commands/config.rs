//! Config command - View and validate reporter configuration
//!
//! Provides the `errorreporter config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use errorreporter::{ReporterConfig, StatusPolicy};
use tracing::info;

use crate::output::{Output, OutputFormat};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(ReporterConfig::default_path);

        match self {
            ConfigCommand::Show => execute_show(&path, format),
            ConfigCommand::Validate => execute_validate(&path, format),
        }
    }
}

fn load(path: &Path) -> Result<ReporterConfig> {
    ReporterConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn execute_show(path: &Path, format: OutputFormat) -> Result<()> {
    let output = Output::new(format);
    let config = load(path)?;

    info!(config_path = %path.display(), "Showing configuration");

    if output.is_json() {
        let json = serde_json::to_value(&config)
            .context("Failed to serialize configuration to JSON")?;
        output.print_json(&json);
        return Ok(());
    }

    output.success(&format!("Configuration ({})", path.display()));
    output.info("");

    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
    for line in yaml.lines() {
        output.info(line);
    }

    if config.status_reasons.is_none() {
        output.info("");
        output.info("Failure statuses (default):");
        let policy = StatusPolicy::default();
        for code in policy.codes() {
            output.info(&format!(
                "  {code}: {}",
                policy.classify(code).unwrap_or_default()
            ));
        }
    }

    Ok(())
}

fn execute_validate(path: &Path, format: OutputFormat) -> Result<()> {
    let output = Output::new(format);
    let config = load(path)?;
    let errors = config.validate();

    info!(config_path = %path.display(), errors = errors.len(), "Validated configuration");

    if output.is_json() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        output.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": path.display().to_string(),
            "errors": messages,
        }));
    } else if errors.is_empty() {
        output.success(&format!("Configuration is valid ({})", path.display()));
    } else {
        output.error(&format!("{} problem(s) in {}", errors.len(), path.display()));
        for error in &errors {
            output.info(&error.to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Configuration is invalid")
    }
}
