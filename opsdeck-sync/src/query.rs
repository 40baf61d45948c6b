//! Query execution.
//!
//! One [`QueryManager`] per query kind: it knows how to build the
//! network request from the query's params and how to turn a
//! successful response into domain data. The shared [`run_fetch`]
//! driver does the rest — send, classify, funnel every outcome into a
//! `RemoteData` — so no manager ever lets an error escape its
//! boundary.

use crate::error::{SyncError, SyncResult};
use crate::state::CachedData;
use crate::transport::{ApiRequest, Transport};
use opsdeck_types::{QueryParams, RemoteData, ResourceSet};
use std::sync::Arc;
use tracing::debug;

/// Executes one query kind.
pub trait QueryManager: Send + Sync {
    /// The kind this manager serves.
    fn kind(&self) -> &'static str;

    /// Builds the network request for the given params.
    fn request(&self, params: &QueryParams) -> SyncResult<ApiRequest>;

    /// Maps a successful response body to domain data.
    fn decode(&self, body: serde_json::Value) -> SyncResult<ResourceSet>;
}

/// Fetches once through a manager and returns the outcome as cache
/// data. Never fails: request-building errors, transport failures,
/// HTTP error statuses and decode errors all land in `Failed`.
pub(crate) async fn run_fetch(
    manager: &Arc<dyn QueryManager>,
    transport: &Arc<dyn Transport>,
    params: &QueryParams,
) -> CachedData {
    let request = match manager.request(params) {
        Ok(request) => request,
        Err(err) => return RemoteData::failed(err),
    };

    match transport.send(request).await {
        Ok(response) if response.is_success() => match manager.decode(response.body) {
            Ok(data) => RemoteData::success(data),
            Err(err) => RemoteData::failed(err),
        },
        Ok(response) => {
            debug!(
                "query {} returned {}: {}",
                manager.kind(),
                response.status,
                response.error_message()
            );
            RemoteData::failed(SyncError::from_status(
                response.status,
                response.error_message(),
            ))
        }
        Err(err) => RemoteData::failed(err),
    }
}

/// Reads a required parameter, treating its absence as a wiring bug
/// rather than a user-facing failure.
pub(crate) fn require_param(params: &QueryParams, key: &str) -> SyncResult<String> {
    params
        .get(key)
        .map(ToString::to_string)
        .ok_or_else(|| SyncError::Resolution(format!("required query param `{key}` missing")))
}

/// Renders every param as a query-string pair, in fingerprint order.
pub(crate) fn passthrough_params(params: &QueryParams) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}
