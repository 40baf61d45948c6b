//! Domain resources served by the orchestration API.
//!
//! These mirror the JSON shapes of the REST endpoints. Resources that
//! are mutated through commands (instances, versions) carry a
//! `version` counter the server increments on every successful
//! mutation; see `Command::expected_version`.

use crate::ids::InstanceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Connectivity and availability state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Online,
    Paused,
    Offline,
    Unreachable,
}

/// A worker agent registered with the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent name; agents are addressed by name, not id.
    pub name: String,
    pub status: AgentStatus,
    /// Software version the agent reported, if it has checked in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    /// Last heartbeat, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<u64>,
}

/// A workflow instance. Versioned resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    /// Name of the agent the instance runs on.
    pub agent: String,
    /// Lifecycle state as reported by the server (`running`,
    /// `completed`, `failed`, ...). Opaque to the sync core.
    pub state: String,
    /// Optimistic-concurrency counter, incremented by the server on
    /// every successful mutation.
    pub version: u64,
    /// Free-form attributes editable from the console.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Lifecycle state of a package version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionState {
    Draft,
    Promoted,
    Retired,
}

/// A published package version. Versioned resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: String,
    /// Package the version belongs to.
    pub package: String,
    /// Human-facing version number, e.g. `"2.11.0"`.
    pub number: String,
    pub state: VersionState,
    /// Optimistic-concurrency counter, distinct from `number`.
    pub version: u64,
}

/// One page of a list-shaped resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching items across all pages.
    pub total: u64,
    pub current_page: u32,
    pub page_size: u32,
}

/// Everything a query can yield.
///
/// The cache stores one `ResourceSet` per fingerprint; views fold
/// over the `RemoteData` wrapper and then match the variant their
/// query kind is known to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceSet {
    Agents(Vec<Agent>),
    Instances(Page<Instance>),
    Instance(Instance),
    Versions(Vec<VersionRecord>),
}

impl ResourceSet {
    /// Replaces a single instance in place, wherever it appears.
    ///
    /// Used when a command's effect is narrower than the cached
    /// collection (an attribute edit bumping one instance's version)
    /// so the rest of a cached page survives the update. Returns
    /// whether anything matched.
    pub fn merge_instance(&mut self, updated: &Instance) -> bool {
        match self {
            Self::Instances(page) => {
                let mut hit = false;
                for item in &mut page.items {
                    if item.id == updated.id {
                        *item = updated.clone();
                        hit = true;
                    }
                }
                hit
            }
            Self::Instance(current) if current.id == updated.id => {
                *current = updated.clone();
                true
            }
            _ => false,
        }
    }

    /// Replaces a single version record in place. Returns whether
    /// anything matched.
    pub fn merge_version(&mut self, updated: &VersionRecord) -> bool {
        match self {
            Self::Versions(records) => {
                let mut hit = false;
                for item in records.iter_mut() {
                    if item.id == updated.id {
                        *item = updated.clone();
                        hit = true;
                    }
                }
                hit
            }
            _ => false,
        }
    }
}
