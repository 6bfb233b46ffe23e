//! ErrorReporter CLI - Send error reports from the command line
//!
//! Provides commands for:
//! - Sending a report built from a message and its causes
//! - Previewing the payload that would be sent
//! - Showing and validating the configuration file

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand,
    send::{PreviewCommand, SendCommand},
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "errorreporter", version, about = "Report errors to a remote issue tracker")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send an error report
    Send(SendCommand),
    /// Print the payload that would be sent, without sending it
    Preview(PreviewCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Send(cmd) => cmd.execute(config_path, format).await,
        Commands::Preview(cmd) => cmd.execute(config_path, format).await,
        Commands::Config(cmd) => cmd.execute(config_path, format).await,
    }
}
