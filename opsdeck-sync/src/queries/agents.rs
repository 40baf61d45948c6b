//! Agent queries.

use crate::error::SyncResult;
use crate::query::{passthrough_params, QueryManager};
use crate::transport::ApiRequest;
use opsdeck_types::{query_kinds, Agent, QueryParams, ResourceSet};
use serde_json::Value;

/// `agent.list` — GET /agents with filter/sort/page params passed
/// through from the caller.
pub struct AgentListManager;

impl QueryManager for AgentListManager {
    fn kind(&self) -> &'static str {
        query_kinds::AGENT_LIST
    }

    fn request(&self, params: &QueryParams) -> SyncResult<ApiRequest> {
        let mut request = ApiRequest::get("agents");
        request.query = passthrough_params(params);
        Ok(request)
    }

    fn decode(&self, body: Value) -> SyncResult<ResourceSet> {
        let agents: Vec<Agent> = serde_json::from_value(body)?;
        Ok(ResourceSet::Agents(agents))
    }
}
