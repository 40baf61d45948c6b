//! Package-version queries.

use crate::error::SyncResult;
use crate::query::{passthrough_params, QueryManager};
use crate::transport::ApiRequest;
use opsdeck_types::{query_kinds, QueryParams, ResourceSet, VersionRecord};
use serde_json::Value;

/// `version.list` — GET /versions, usually scoped by a `package`
/// param.
pub struct VersionListManager;

impl QueryManager for VersionListManager {
    fn kind(&self) -> &'static str {
        query_kinds::VERSION_LIST
    }

    fn request(&self, params: &QueryParams) -> SyncResult<ApiRequest> {
        let mut request = ApiRequest::get("versions");
        request.query = passthrough_params(params);
        Ok(request)
    }

    fn decode(&self, body: Value) -> SyncResult<ResourceSet> {
        let versions: Vec<VersionRecord> = serde_json::from_value(body)?;
        Ok(ResourceSet::Versions(versions))
    }
}
