//! Agent commands.

use crate::command::{require_field, CommandManager};
use crate::error::SyncResult;
use crate::transport::ApiRequest;
use opsdeck_types::{command_kinds, query_kinds, Command, Query};

/// `agent.pause` — POST /agent/{name}/pause, empty body. Pausing
/// changes the agent list, so `agent.list` is refreshed on success.
pub struct PauseAgentManager;

impl CommandManager for PauseAgentManager {
    fn kind(&self) -> &'static str {
        command_kinds::AGENT_PAUSE
    }

    fn refresh_kinds(&self) -> &'static [&'static str] {
        &[query_kinds::AGENT_LIST]
    }

    fn request(&self, command: &Command) -> SyncResult<ApiRequest> {
        let name = require_field(command, "name")?;
        Ok(ApiRequest::post(format!("agent/{name}/pause")))
    }

    fn refreshes(&self, _command: &Command) -> Vec<Query> {
        vec![Query::new(query_kinds::AGENT_LIST)]
    }
}

/// `agent.resume` — POST /agent/{name}/resume, empty body.
pub struct ResumeAgentManager;

impl CommandManager for ResumeAgentManager {
    fn kind(&self) -> &'static str {
        command_kinds::AGENT_RESUME
    }

    fn refresh_kinds(&self) -> &'static [&'static str] {
        &[query_kinds::AGENT_LIST]
    }

    fn request(&self, command: &Command) -> SyncResult<ApiRequest> {
        let name = require_field(command, "name")?;
        Ok(ApiRequest::post(format!("agent/{name}/resume")))
    }

    fn refreshes(&self, _command: &Command) -> Vec<Query> {
        vec![Query::new(query_kinds::AGENT_LIST)]
    }
}
