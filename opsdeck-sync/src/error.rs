//! Error types for the sync core.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Query and command managers never let these escape as panics: every
/// outcome funnels into a `RemoteData::Failed` cache entry or a
/// command result, so consuming views have no error plumbing to write.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    /// Transport failure, no response. Retryable by the user.
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the request (4xx other than 409). Not
    /// auto-retried.
    #[error("validation error ({status}): {message}")]
    Validation { status: u16, message: String },

    /// Optimistic-concurrency conflict (409): the resource's version
    /// advanced past what the caller expected. Never blindly retried;
    /// the owning resource is refetched instead.
    #[error("version conflict: {0}")]
    Conflict(String),

    /// A response body did not decode into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// No manager is registered for a kind, or the wiring references
    /// a kind that does not resolve. A programming error caught at
    /// construction time, never a user-facing runtime state.
    #[error("resolution error: {0}")]
    Resolution(String),
}

impl SyncError {
    /// Classifies a non-2xx HTTP status, taking the response body as
    /// the human-facing message.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            409 => Self::Conflict(message),
            400..=499 => Self::Validation { status, message },
            _ => Self::Network(format!("server returned {status}: {message}")),
        }
    }

    /// Whether this error is the distinguishable conflict reason.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
