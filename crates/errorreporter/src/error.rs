//! Error types for error reporting

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Failure of the report operation itself (as opposed to the error being reported)
#[derive(Debug, Error)]
pub enum ReportFailure {
    /// The collection endpoint could not be reached (DNS, TLS, connect, I/O)
    #[error("failed to reach collection endpoint: {0}")]
    Transport(#[source] reqwest::Error),

    /// The collection endpoint answered with a status listed in the [`StatusPolicy`]
    ///
    /// [`StatusPolicy`]: crate::status::StatusPolicy
    #[error("{reason}")]
    Status { status: u16, reason: String },

    /// The payload could not be serialized
    #[error("failed to encode report payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// A configured identifier cannot be sent as an HTTP header value
    #[error("invalid value for header {header}: {value:?}")]
    InvalidHeader { header: &'static str, value: String },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ReportFailure {
    /// Human-readable reason for the failure.
    ///
    /// For classified status codes this is the configured reason text,
    /// e.g. `"User/Repository not found"`.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// The HTTP status that caused this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the request never produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Error returned by [`Reporter::report`] and friends.
///
/// Exactly one of two things went wrong from the caller's point of view:
/// either the caller asked for the original error back (`Rethrown`), or it
/// did not and reporting failed (`Failed`). When both apply, the original
/// error wins and the reporting failure rides along as context.
///
/// [`Reporter::report`]: crate::reporter::Reporter::report
#[derive(Debug)]
pub enum ReportError<E> {
    /// The original error, handed back after reporting finished.
    Rethrown {
        error: E,
        /// Set when the report attempt itself failed before the rethrow.
        failure: Option<ReportFailure>,
    },
    /// Reporting failed and no rethrow was requested.
    Failed(ReportFailure),
}

impl<E> ReportError<E> {
    /// The original error, if this is a rethrow.
    pub fn original(&self) -> Option<&E> {
        match self {
            Self::Rethrown { error, .. } => Some(error),
            Self::Failed(_) => None,
        }
    }

    /// Consumes `self`, returning the original error if this is a rethrow.
    pub fn into_original(self) -> Option<E> {
        match self {
            Self::Rethrown { error, .. } => Some(error),
            Self::Failed(_) => None,
        }
    }

    /// The reporting failure, whether it is the primary error or was masked by a rethrow.
    pub fn failure(&self) -> Option<&ReportFailure> {
        match self {
            Self::Rethrown { failure, .. } => failure.as_ref(),
            Self::Failed(failure) => Some(failure),
        }
    }

    /// Returns true if the original error was handed back.
    pub fn is_rethrown(&self) -> bool {
        matches!(self, Self::Rethrown { .. })
    }
}

impl<E> From<ReportFailure> for ReportError<E> {
    fn from(failure: ReportFailure) -> Self {
        Self::Failed(failure)
    }
}

// A rethrown error must look like the original, so both variants are transparent.
impl<E: fmt::Display> fmt::Display for ReportError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rethrown { error, .. } => fmt::Display::fmt(error, f),
            Self::Failed(failure) => fmt::Display::fmt(failure, f),
        }
    }
}

impl<E: StdError + 'static> StdError for ReportError<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Rethrown { error, .. } => error.source(),
            Self::Failed(failure) => failure.source(),
        }
    }
}
