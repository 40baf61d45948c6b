//! The built-in query catalog: one manager per kind.

mod agents;
mod instances;
mod versions;

pub use agents::AgentListManager;
pub use instances::{InstanceDetailManager, InstanceListManager};
pub use versions::VersionListManager;

use crate::query::QueryManager;
use std::sync::Arc;

/// Every query manager the console ships with.
#[must_use]
pub fn builtin_managers() -> Vec<Arc<dyn QueryManager>> {
    vec![
        Arc::new(AgentListManager),
        Arc::new(InstanceListManager),
        Arc::new(InstanceDetailManager),
        Arc::new(VersionListManager),
    ]
}
