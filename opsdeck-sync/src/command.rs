//! Command execution contracts.
//!
//! One [`CommandManager`] per command kind: it builds the mutating
//! request and declares, statically, which queries go stale when the
//! command succeeds. The resolver owns execution, outcome
//! classification and the dependent refetches; managers stay pure
//! request builders.

use crate::error::{SyncError, SyncResult};
use crate::transport::ApiRequest;
use opsdeck_types::{Command, Instance, Query, VersionRecord};
use serde_json::Value;

/// A narrow server echo of the mutated resource, merged into cached
/// collections so one edit does not discard a whole cached page.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEcho {
    Instance(Instance),
    Version(VersionRecord),
}

/// Executes one command kind.
pub trait CommandManager: Send + Sync {
    /// The kind this manager serves.
    fn kind(&self) -> &'static str;

    /// The query kinds that go stale when this command succeeds.
    /// Declared statically so the resolver can validate the wiring at
    /// construction time.
    fn refresh_kinds(&self) -> &'static [&'static str];

    /// Builds the mutating request. Malformed payloads are rejected
    /// here as validation errors, before anything is sent.
    fn request(&self, command: &Command) -> SyncResult<ApiRequest>;

    /// The concrete dependent queries to re-run after success.
    /// Kinds must be a subset of [`refresh_kinds`](Self::refresh_kinds).
    fn refreshes(&self, command: &Command) -> Vec<Query>;

    /// The owning resource to re-read after a version conflict, so
    /// the caller sees current server state instead of silently
    /// overwriting a concurrent edit.
    fn conflict_refresh(&self, _command: &Command) -> Option<Query> {
        None
    }

    /// Extracts the mutated resource from a successful response, if
    /// the endpoint echoes it back.
    fn echo(&self, _body: &Value) -> Option<CommandEcho> {
        None
    }
}

/// Reads a required string field out of a command payload.
pub(crate) fn require_field(command: &Command, field: &str) -> SyncResult<String> {
    command
        .payload_str(field)
        .map(str::to_string)
        .ok_or_else(|| SyncError::Validation {
            status: 400,
            message: format!("command {} requires field `{field}`", command.kind),
        })
}
