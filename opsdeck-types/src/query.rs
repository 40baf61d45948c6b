//! Query descriptions and cache-slot fingerprints.
//!
//! A [`Query`] is a small, declarative record: a `kind` selecting the
//! manager that knows how to execute it, and a set of primitive
//! parameters (filter, sort, page size, identifiers). Two queries
//! with equal kind and structurally equal params derive the same
//! [`Fingerprint`] and therefore share one cache slot and one polling
//! task.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known query kinds served by the built-in managers.
pub mod kinds {
    /// List all agents visible in the current environment.
    pub const AGENT_LIST: &str = "agent.list";
    /// List workflow instances, paged and filterable.
    pub const INSTANCE_LIST: &str = "instance.list";
    /// A single workflow instance with its attributes.
    pub const INSTANCE_DETAIL: &str = "instance.detail";
    /// List package versions.
    pub const VERSION_LIST: &str = "version.list";
}

/// A primitive query parameter value.
///
/// Parameters arrive pre-parsed from an outer layer (URL state); the
/// sync core only carries them into requests and fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Ordered parameter map. `BTreeMap` keeps iteration order stable so
/// structurally equal params always render the same fingerprint.
pub type QueryParams = BTreeMap<String, ParamValue>;

/// A typed request for read-only data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Selects the manager that executes this query.
    pub kind: String,
    /// Filter/sort/page/identifier parameters.
    pub params: QueryParams,
}

impl Query {
    /// Creates a query with no parameters.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: QueryParams::new(),
        }
    }

    /// Adds a parameter (builder style).
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Derives the stable cache-slot key for this query.
    ///
    /// Equal kind and structurally equal params always produce the
    /// same fingerprint; the derivation is pure.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::derive(&self.kind, &self.params)
    }
}

/// The stable key identifying "this query with these parameters".
///
/// Keys the cache slot and names the scheduler task for a continuous
/// query. Opaque to consumers; the rendered form exists for logging
/// and map keys, not for parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derives a fingerprint from a kind and parameter map.
    #[must_use]
    pub fn derive(kind: &str, params: &QueryParams) -> Self {
        let mut out = String::from(kind);
        for (i, (key, value)) in params.iter().enumerate() {
            out.push(if i == 0 { '?' } else { '&' });
            out.push_str(key);
            out.push('=');
            out.push_str(&value.to_string());
        }
        Self(out)
    }

    /// The rendered key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
