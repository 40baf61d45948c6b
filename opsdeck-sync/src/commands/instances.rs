//! Workflow-instance commands.

use crate::command::{require_field, CommandEcho, CommandManager};
use crate::error::{SyncError, SyncResult};
use crate::transport::ApiRequest;
use opsdeck_types::{command_kinds, query_kinds, Command, Instance, Query};
use serde_json::{json, Value};

/// `instance.delete` — DELETE /instance/{id}. The instance list goes
/// stale on success.
pub struct DeleteInstanceManager;

impl CommandManager for DeleteInstanceManager {
    fn kind(&self) -> &'static str {
        command_kinds::INSTANCE_DELETE
    }

    fn refresh_kinds(&self) -> &'static [&'static str] {
        &[query_kinds::INSTANCE_LIST]
    }

    fn request(&self, command: &Command) -> SyncResult<ApiRequest> {
        let id = require_field(command, "id")?;
        Ok(ApiRequest::delete(format!("instance/{id}")))
    }

    fn refreshes(&self, _command: &Command) -> Vec<Query> {
        vec![Query::new(query_kinds::INSTANCE_LIST)]
    }
}

/// `instance.update-attributes` — PATCH /instance/{id}/attributes
/// with the new attributes and the `current_version` the caller last
/// read. A 409 means the instance moved on since then; the detail
/// query is re-read instead of retrying the write.
pub struct UpdateInstanceAttributesManager;

impl CommandManager for UpdateInstanceAttributesManager {
    fn kind(&self) -> &'static str {
        command_kinds::INSTANCE_UPDATE_ATTRIBUTES
    }

    fn refresh_kinds(&self) -> &'static [&'static str] {
        &[query_kinds::INSTANCE_DETAIL]
    }

    fn request(&self, command: &Command) -> SyncResult<ApiRequest> {
        let id = require_field(command, "id")?;
        let attributes = command
            .payload
            .get("attributes")
            .cloned()
            .ok_or_else(|| SyncError::Validation {
                status: 400,
                message: format!("command {} requires field `attributes`", command.kind),
            })?;
        let version = command.expected_version.ok_or_else(|| SyncError::Validation {
            status: 400,
            message: "attribute updates require an expected version".to_string(),
        })?;

        Ok(ApiRequest::patch(format!("instance/{id}/attributes")).with_body(json!({
            "attributes": attributes,
            "current_version": version,
        })))
    }

    fn refreshes(&self, command: &Command) -> Vec<Query> {
        self.detail_query(command).into_iter().collect()
    }

    fn conflict_refresh(&self, command: &Command) -> Option<Query> {
        self.detail_query(command)
    }

    fn echo(&self, body: &Value) -> Option<CommandEcho> {
        let instance: Instance = serde_json::from_value(body.clone()).ok()?;
        Some(CommandEcho::Instance(instance))
    }
}

impl UpdateInstanceAttributesManager {
    fn detail_query(&self, command: &Command) -> Option<Query> {
        let id = command.payload_str("id")?;
        Some(Query::new(query_kinds::INSTANCE_DETAIL).with_param("id", id))
    }
}
