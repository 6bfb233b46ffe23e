//! Pre-send hooks
//!
//! A hook sees every payload before it leaves the process. It may rewrite
//! the payload and decides whether it is sent at all.
//!
//! Provides:
//! - `PreSendHook`: the hook trait (implemented for plain closures)
//! - `Redactor`: strips home directory, username and file names from traces
//! - `TransientFilter`: suppresses timeouts, refused connections and rate limiting
//! - `HookChain`: runs several hooks in order

use crate::config::RedactConfig;
use crate::payload::ReportPayload;

/// Decides, and optionally rewrites, a payload before it is submitted.
pub trait PreSendHook: Send + Sync {
    /// Returns `true` to suppress submission of `payload`.
    fn suppress(&self, payload: &mut ReportPayload) -> bool;
}

impl<F> PreSendHook for F
where
    F: Fn(&mut ReportPayload) -> bool + Send + Sync,
{
    fn suppress(&self, payload: &mut ReportPayload) -> bool {
        self(payload)
    }
}

// ============================================================================
// Redactor
// ============================================================================

/// Replaces personally identifiable information in the trace with placeholders.
///
/// Never suppresses. The fingerprint is recomputed from the redacted trace so
/// that the same failure on different machines deduplicates to one issue.
pub struct Redactor {
    strip_paths: bool,
    strip_usernames: bool,
    strip_filenames: bool,
    home_dir: String,
    username: String,
}

impl Redactor {
    /// Creates a new `Redactor` for the current user.
    pub fn new(config: &RedactConfig) -> Self {
        let home_dir = dirs::home_dir()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_default();

        Self::with_identity(config, home_dir, username)
    }

    /// Creates a `Redactor` for an explicit home directory and username.
    pub fn with_identity(
        config: &RedactConfig,
        home_dir: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            strip_paths: config.strip_paths,
            strip_usernames: config.strip_usernames,
            strip_filenames: config.strip_filenames,
            home_dir: home_dir.into(),
            username: username.into(),
        }
    }

    /// Apply the configured replacements to `text`.
    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.strip_paths && !self.home_dir.is_empty() {
            result = result.replace(&self.home_dir, "<HOME>");
        }

        if self.strip_usernames && !self.username.is_empty() {
            result = result.replace(&self.username, "<USER>");
        }

        if self.strip_filenames {
            result = redact_filenames(&result);
        }

        result
    }
}

impl PreSendHook for Redactor {
    fn suppress(&self, payload: &mut ReportPayload) -> bool {
        let redacted = self.redact(payload.trace());
        if redacted != payload.trace() {
            payload.set_trace(&redacted);
        }
        false
    }
}

/// Replace the basename of path-like segments (`/dir/name.ext`) with `<FILE>.ext`.
fn redact_filenames(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        result.push(ch);

        if ch == '/' {
            let mut segment = String::new();
            while let Some(&next) = chars.peek() {
                if matches!(next, '/' | ' ' | '\n' | ':' | '"' | '\'' | ')') {
                    break;
                }
                segment.push(next);
                chars.next();
            }

            // Only segments followed by another separator are directories
            let is_last = chars.peek() != Some(&'/');
            match segment.rfind('.') {
                Some(dot) if is_last && dot > 0 && dot < segment.len() - 1 => {
                    result.push_str("<FILE>");
                    result.push_str(&segment[dot..]);
                }
                _ => result.push_str(&segment),
            }
        }
    }

    result
}

// ============================================================================
// TransientFilter
// ============================================================================

/// Word sequences marking errors that are expected to go away on their own.
///
/// Matched against whole words, so `429` inside `offset 14290` is not a hit.
const TRANSIENT_PHRASES: &[&[&str]] = &[
    &["timeout"],
    &["timed", "out"],
    &["connection", "refused"],
    &["rate", "limit"],
    &["rate", "limited"],
    &["too", "many", "requests"],
    &["http", "429"],
    &["status", "429"],
    &["code", "429"],
];

/// Suppresses reports for transient errors that are not worth filing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientFilter;

impl TransientFilter {
    /// Returns true if the error text looks transient.
    pub fn is_transient(text: &str) -> bool {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        TRANSIENT_PHRASES
            .iter()
            .any(|phrase| words.windows(phrase.len()).any(|window| window == *phrase))
    }
}

impl PreSendHook for TransientFilter {
    fn suppress(&self, payload: &mut ReportPayload) -> bool {
        Self::is_transient(payload.trace())
    }
}

// ============================================================================
// HookChain
// ============================================================================

/// Runs hooks in insertion order; the first one to suppress stops the chain.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn PreSendHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook to the end of the chain.
    pub fn with(mut self, hook: impl PreSendHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn push(&mut self, hook: impl PreSendHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl PreSendHook for HookChain {
    fn suppress(&self, payload: &mut ReportPayload) -> bool {
        self.hooks.iter().any(|hook| hook.suppress(payload))
    }
}
