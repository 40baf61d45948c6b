//! Core type definitions for the opsdeck console.
//!
//! This crate defines the fundamental, I/O-free types shared by every
//! part of the data-synchronization core:
//! - Identifiers for workflow instances (UUID v7)
//! - Query and Command descriptions, plus the fingerprint that keys
//!   a query's cache slot
//! - `RemoteData`, the four-state lifecycle of an asynchronous read
//! - Domain resources served by the orchestration API (agents,
//!   instances, package versions)
//!
//! Everything here is pure data: no transport, no cache, no timers.
//! Those live in `opsdeck-sync`.

mod command;
mod ids;
mod query;
mod remote_data;
mod resource;

pub use command::{kinds as command_kinds, Command};
pub use ids::InstanceId;
pub use query::{kinds as query_kinds, Fingerprint, ParamValue, Query, QueryParams};
pub use remote_data::RemoteData;
pub use resource::{
    Agent, AgentStatus, Instance, Page, ResourceSet, VersionRecord, VersionState,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when constructing these types from raw input.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An identifier string was not a valid UUID.
    #[error("invalid id: {0}")]
    InvalidId(#[from] uuid::Error),
}
