//! The built-in command catalog: one manager per kind.

mod agents;
mod instances;
mod versions;

pub use agents::{PauseAgentManager, ResumeAgentManager};
pub use instances::{DeleteInstanceManager, UpdateInstanceAttributesManager};
pub use versions::PromoteVersionManager;

use crate::command::CommandManager;
use std::sync::Arc;

/// Every command manager the console ships with.
#[must_use]
pub fn builtin_managers() -> Vec<Arc<dyn CommandManager>> {
    vec![
        Arc::new(PauseAgentManager),
        Arc::new(ResumeAgentManager),
        Arc::new(DeleteInstanceManager),
        Arc::new(UpdateInstanceAttributesManager),
        Arc::new(PromoteVersionManager),
    ]
}
