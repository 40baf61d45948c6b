//! Command descriptions.
//!
//! A [`Command`] is the mutating counterpart of a query: a `kind`
//! selecting the manager that executes it, an open JSON payload, and
//! an optional expected resource version for optimistic concurrency.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known command kinds served by the built-in managers.
pub mod kinds {
    /// Pause an agent so it stops accepting work.
    pub const AGENT_PAUSE: &str = "agent.pause";
    /// Resume a paused agent.
    pub const AGENT_RESUME: &str = "agent.resume";
    /// Delete a workflow instance.
    pub const INSTANCE_DELETE: &str = "instance.delete";
    /// Update a workflow instance's attributes.
    pub const INSTANCE_UPDATE_ATTRIBUTES: &str = "instance.update-attributes";
    /// Promote a package version.
    pub const VERSION_PROMOTE: &str = "version.promote";
}

/// A typed request to mutate server state.
///
/// Commands carry no cached state of their own; their durable effect
/// is the mutation plus the dependent query refreshes the resolver
/// issues afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Selects the manager that executes this command.
    pub kind: String,
    /// Command-specific fields (identifiers, new attribute values).
    pub payload: Value,
    /// The resource version the caller last read, for optimistic
    /// concurrency. The server rejects the mutation with 409 when the
    /// resource has moved past this version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

impl Command {
    /// Creates a command with the given payload and no version claim.
    #[must_use]
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
            expected_version: None,
        }
    }

    /// Sets the expected resource version (builder style).
    #[must_use]
    pub fn with_expected_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }

    /// Reads a string field out of the payload.
    #[must_use]
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }
}
