//! Package-version commands.

use crate::command::{require_field, CommandEcho, CommandManager};
use crate::error::SyncResult;
use crate::transport::ApiRequest;
use opsdeck_types::{command_kinds, query_kinds, Command, Query, VersionRecord};
use serde_json::Value;

/// `version.promote` — POST /version/{id}/promote. Carries the
/// `current_version` the caller last read as a query parameter; the
/// version list goes stale on success.
pub struct PromoteVersionManager;

impl CommandManager for PromoteVersionManager {
    fn kind(&self) -> &'static str {
        command_kinds::VERSION_PROMOTE
    }

    fn refresh_kinds(&self) -> &'static [&'static str] {
        &[query_kinds::VERSION_LIST]
    }

    fn request(&self, command: &Command) -> SyncResult<ApiRequest> {
        let id = require_field(command, "id")?;
        let mut request = ApiRequest::post(format!("version/{id}/promote"));
        if let Some(version) = command.expected_version {
            request = request.with_query("current_version", version.to_string());
        }
        Ok(request)
    }

    fn refreshes(&self, command: &Command) -> Vec<Query> {
        let mut query = Query::new(query_kinds::VERSION_LIST);
        if let Some(package) = command.payload_str("package") {
            query = query.with_param("package", package);
        }
        vec![query]
    }

    fn conflict_refresh(&self, command: &Command) -> Option<Query> {
        self.refreshes(command).into_iter().next()
    }

    fn echo(&self, body: &Value) -> Option<CommandEcho> {
        let record: VersionRecord = serde_json::from_value(body.clone()).ok()?;
        Some(CommandEcho::Version(record))
    }
}
