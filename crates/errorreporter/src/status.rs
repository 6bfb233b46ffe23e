//! Response status classification
//!
//! Maps collection-endpoint status codes to reporting-failure reasons.
//! Any status not in the table counts as success.

use std::collections::BTreeMap;

use crate::error::ReportFailure;

/// Default failure table understood by the collection service.
const DEFAULT_REASONS: &[(u16, &str)] = &[
    (400, "Bad request; possibly wrong protocol version"),
    (404, "User/Repository not found"),
    (410, "Repository has issues disabled"),
    (500, "Server error"),
    (503, "Upstream service down"),
];

/// Table of status codes that count as reporting failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPolicy {
    reasons: BTreeMap<u16, String>,
}

impl StatusPolicy {
    /// Creates a policy from an explicit table, replacing the defaults entirely.
    pub fn new(reasons: BTreeMap<u16, String>) -> Self {
        Self { reasons }
    }

    /// Adds or replaces the reason for `status`.
    pub fn with_reason(mut self, status: u16, reason: impl Into<String>) -> Self {
        self.reasons.insert(status, reason.into());
        self
    }

    /// Stops treating `status` as a failure.
    pub fn without(mut self, status: u16) -> Self {
        self.reasons.remove(&status);
        self
    }

    /// Returns the failure reason for `status`, or `None` if it is a success.
    pub fn classify(&self, status: u16) -> Option<&str> {
        self.reasons.get(&status).map(String::as_str)
    }

    /// Turns a response status into `Ok(())` or the matching failure.
    pub fn check(&self, status: u16) -> Result<(), ReportFailure> {
        match self.classify(status) {
            Some(reason) => Err(ReportFailure::Status {
                status,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// All classified status codes, ascending.
    pub fn codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.reasons.keys().copied()
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            reasons: DEFAULT_REASONS
                .iter()
                .map(|(code, reason)| (*code, reason.to_string()))
                .collect(),
        }
    }
}
