//! Error trace rendering
//!
//! Turns an error and its `source()` chain into the text that is sent as the
//! report body and hashed for deduplication.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::Write;

/// Separates the rendered error chain from an appended backtrace.
const BACKTRACE_HEADING: &str = "\n\nStack backtrace:\n";

/// Render the full trace of `error`.
///
/// The first line is the error's `Display` output. If the error has causes,
/// they follow under a `Caused by:` heading, one per line, numbered and
/// indented:
///
/// ```text
/// failed to load settings
///
/// Caused by:
///     0: failed to read settings.yaml
///     1: permission denied
/// ```
///
/// Multi-line cause messages keep their continuation lines aligned under
/// the first.
pub fn render(error: &(dyn Error + 'static)) -> String {
    let mut out = error.to_string();

    let causes: Vec<String> = chain(error).skip(1).map(|e| e.to_string()).collect();
    if causes.is_empty() {
        return out;
    }

    out.push_str("\n\nCaused by:");
    for (i, cause) in causes.iter().enumerate() {
        let mut lines = cause.lines();
        let first = lines.next().unwrap_or_default();
        let _ = write!(out, "\n    {i}: {first}");
        for line in lines {
            let _ = write!(out, "\n       {line}");
        }
    }

    out
}

/// Render `error` like [`render`], followed by `backtrace` if one was captured.
///
/// Disabled or unsupported backtraces add nothing, so the result equals
/// `render(error)` unless `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` is set.
pub fn render_with_backtrace(error: &(dyn Error + 'static), backtrace: &Backtrace) -> String {
    let mut out = render(error);
    if backtrace.status() == BacktraceStatus::Captured {
        out.push_str(BACKTRACE_HEADING);
        let _ = write!(out, "{backtrace}");
    }
    out
}

/// The error chain part of a rendered trace, without any appended backtrace.
///
/// Fingerprints are computed from this part only: whether frames were
/// captured depends on the environment, not on the failure.
pub fn without_backtrace(trace: &str) -> &str {
    match trace.find(BACKTRACE_HEADING) {
        Some(idx) => &trace[..idx],
        None => trace,
    }
}

/// Iterate over `error` followed by each of its sources.
pub fn chain<'a>(error: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(error), |&e| e.source())
}
