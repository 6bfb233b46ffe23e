//! Report payload
//!
//! The JSON document submitted to the collection endpoint. Built fresh for
//! every report and handed to the pre-send hook as a mutable value before it
//! is encoded.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Opening and closing marker of the fenced code block around the trace.
const FENCE: &str = "```";

/// Number of digest bytes kept in each half of the fingerprint.
const FINGERPRINT_BYTES: usize = 4;

/// The three-field document sent to the collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    /// Application version at report time
    #[serde(rename = "Version")]
    version: String,
    /// Trace text wrapped in a fenced code block
    #[serde(rename = "Error")]
    error: String,
    /// `<hash(trace)>-<hash(version)>`, used for issue deduplication
    #[serde(rename = "Hashcode")]
    hashcode: String,
}

impl ReportPayload {
    /// Build a payload from a rendered trace and the current version.
    pub fn new(trace: &str, version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            hashcode: Self::fingerprint(trace, &version),
            error: fence(trace),
            version,
        }
    }

    /// Deterministic fingerprint of a (trace, version) pair.
    ///
    /// Two short hex digests joined by a hyphen, e.g. `"9f86d081-2c26b46b"`.
    /// An appended backtrace is not part of the trace digest.
    pub fn fingerprint(trace: &str, version: &str) -> String {
        format!(
            "{}-{}",
            short_hash(crate::trace::without_backtrace(trace)),
            short_hash(version)
        )
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The fenced trace as it will be transmitted.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// The trace without its fence.
    pub fn trace(&self) -> &str {
        unfence(&self.error)
    }

    pub fn hashcode(&self) -> &str {
        &self.hashcode
    }

    /// Replace the trace text, re-fencing it and recomputing the fingerprint.
    pub fn set_trace(&mut self, trace: &str) {
        self.hashcode = Self::fingerprint(trace, &self.version);
        self.error = fence(trace);
    }

    /// Replace the raw `Error` field verbatim. The fingerprint is left alone.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = error.into();
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    pub fn set_hashcode(&mut self, hashcode: impl Into<String>) {
        self.hashcode = hashcode.into();
    }

    /// Encode as a compact JSON document.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn fence(trace: &str) -> String {
    format!("{FENCE}\n{trace}\n{FENCE}")
}

fn unfence(error: &str) -> &str {
    error
        .strip_prefix(FENCE)
        .and_then(|s| s.strip_prefix('\n'))
        .and_then(|s| s.strip_suffix(FENCE))
        .and_then(|s| s.strip_suffix('\n'))
        .unwrap_or(error)
}

fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
