//! The four-state lifecycle of an asynchronous read.
//!
//! Every query result in the console is one of exactly four states:
//! the read was never started, it is in flight, it succeeded, or it
//! failed. Consumers branch through [`RemoteData::fold`], which forces
//! all four states to be handled — a view can never "forget" the
//! loading or failed case the way a bare `Option` would allow.

use serde::{Deserialize, Serialize};

/// An asynchronous read in one of four states.
///
/// State transitions are driven by the sync core:
/// `NotAsked` → `Loading` → (`Success` | `Failed`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteData<E, D> {
    /// The read has never been started.
    NotAsked,
    /// A request is in flight; no previous result is available.
    Loading,
    /// The read completed and produced data.
    Success(D),
    /// The read completed with an error.
    Failed(E),
}

impl<E, D> RemoteData<E, D> {
    /// A read that has never been started.
    #[must_use]
    pub const fn not_asked() -> Self {
        Self::NotAsked
    }

    /// A read that is in flight.
    #[must_use]
    pub const fn loading() -> Self {
        Self::Loading
    }

    /// A completed read.
    #[must_use]
    pub const fn success(data: D) -> Self {
        Self::Success(data)
    }

    /// A failed read.
    #[must_use]
    pub const fn failed(error: E) -> Self {
        Self::Failed(error)
    }

    /// Collapses the value by invoking exactly one of the four
    /// handlers. This is the sanctioned way to branch on a
    /// `RemoteData`; call sites never match on variants directly.
    pub fn fold<T>(
        self,
        on_not_asked: impl FnOnce() -> T,
        on_loading: impl FnOnce() -> T,
        on_failed: impl FnOnce(E) -> T,
        on_success: impl FnOnce(D) -> T,
    ) -> T {
        match self {
            Self::NotAsked => on_not_asked(),
            Self::Loading => on_loading(),
            Self::Failed(error) => on_failed(error),
            Self::Success(data) => on_success(data),
        }
    }

    /// Borrowing variant of [`fold`](Self::fold) for observers that
    /// must not consume the value.
    pub fn fold_ref<T>(
        &self,
        on_not_asked: impl FnOnce() -> T,
        on_loading: impl FnOnce() -> T,
        on_failed: impl FnOnce(&E) -> T,
        on_success: impl FnOnce(&D) -> T,
    ) -> T {
        match self {
            Self::NotAsked => on_not_asked(),
            Self::Loading => on_loading(),
            Self::Failed(error) => on_failed(error),
            Self::Success(data) => on_success(data),
        }
    }

    /// Maps the success data, leaving the other states untouched.
    pub fn map<T>(self, f: impl FnOnce(D) -> T) -> RemoteData<E, T> {
        match self {
            Self::NotAsked => RemoteData::NotAsked,
            Self::Loading => RemoteData::Loading,
            Self::Failed(error) => RemoteData::Failed(error),
            Self::Success(data) => RemoteData::Success(f(data)),
        }
    }

    /// Whether the value is `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the value is `Failed`.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The success data, if present.
    #[must_use]
    pub const fn success_ref(&self) -> Option<&D> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// The error, if present.
    #[must_use]
    pub const fn failure_ref(&self) -> Option<&E> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl<E, D> Default for RemoteData<E, D> {
    /// The default state of a cache slot that was never written.
    fn default() -> Self {
        Self::NotAsked
    }
}
