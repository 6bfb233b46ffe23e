//! Terminal output in human or JSON form

use errorreporter::ReportOutcome;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Writes command results to stdout/stderr in the selected format.
///
/// In JSON mode every message is a single-line object; informational lines
/// are dropped so stdout stays machine-readable.
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("\u{2713} {message}"),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"success": true, "message": message}))
            }
        }
    }

    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("\u{2717} Error: {message}"),
            OutputFormat::Json => {
                eprintln!("{}", serde_json::json!({"success": false, "error": message}))
            }
        }
    }

    pub fn warn(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("\u{26a0} Warning: {message}"),
            OutputFormat::Json => {
                eprintln!("{}", serde_json::json!({"level": "warning", "message": message}))
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.format == OutputFormat::Human {
            println!("  {message}");
        }
    }

    pub fn print_json(&self, value: &serde_json::Value) {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }

    /// Report the outcome of a send in the selected format.
    pub fn outcome(&self, outcome: ReportOutcome) {
        if self.is_json() {
            self.print_json(&serde_json::json!({
                "success": true,
                "outcome": outcome_name(outcome),
            }));
            return;
        }

        match outcome {
            ReportOutcome::Sent => self.success("Error report submitted"),
            ReportOutcome::Disabled => self.warn("Reporting is disabled; nothing was sent"),
            ReportOutcome::Suppressed => self.warn("Report suppressed by a pre-send filter"),
        }
    }
}

pub fn outcome_name(outcome: ReportOutcome) -> &'static str {
    match outcome {
        ReportOutcome::Sent => "sent",
        ReportOutcome::Disabled => "disabled",
        ReportOutcome::Suppressed => "suppressed",
    }
}
