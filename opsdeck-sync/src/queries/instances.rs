//! Workflow-instance queries.

use crate::error::SyncResult;
use crate::query::{passthrough_params, require_param, QueryManager};
use crate::transport::ApiRequest;
use opsdeck_types::{query_kinds, Instance, Page, QueryParams, ResourceSet};
use serde_json::Value;

/// `instance.list` — GET /instances, paged; filter/sort/pageSize/
/// currentPage params pass through from the caller's URL state.
pub struct InstanceListManager;

impl QueryManager for InstanceListManager {
    fn kind(&self) -> &'static str {
        query_kinds::INSTANCE_LIST
    }

    fn request(&self, params: &QueryParams) -> SyncResult<ApiRequest> {
        let mut request = ApiRequest::get("instances");
        request.query = passthrough_params(params);
        Ok(request)
    }

    fn decode(&self, body: Value) -> SyncResult<ResourceSet> {
        let page: Page<Instance> = serde_json::from_value(body)?;
        Ok(ResourceSet::Instances(page))
    }
}

/// `instance.detail` — GET /instance/{id}. Requires an `id` param.
pub struct InstanceDetailManager;

impl QueryManager for InstanceDetailManager {
    fn kind(&self) -> &'static str {
        query_kinds::INSTANCE_DETAIL
    }

    fn request(&self, params: &QueryParams) -> SyncResult<ApiRequest> {
        let id = require_param(params, "id")?;
        Ok(ApiRequest::get(format!("instance/{id}")))
    }

    fn decode(&self, body: Value) -> SyncResult<ResourceSet> {
        let instance: Instance = serde_json::from_value(body)?;
        Ok(ResourceSet::Instance(instance))
    }
}
