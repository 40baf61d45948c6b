use opsdeck_sync::manual::ManualScheduler;
use opsdeck_sync::mock::MockTransport;
use opsdeck_sync::commands::PauseAgentManager;
use opsdeck_sync::queries;
use opsdeck_sync::{
    ApiRequest, ApiResponse, CommandManager, CommandResolver, Dependencies, MemoryStore, Method,
    QueryResolver, StateHelper, SyncConfig, SyncError, SyncResult,
};
use opsdeck_types::{command_kinds, query_kinds, Command, Query, RemoteData, ResourceSet};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

const INSTANCE_ID: &str = "0192f0c1-2345-7890-abcd-ef0123456789";

struct Harness {
    deps: Dependencies,
    transport: Arc<MockTransport>,
}

fn make_harness() -> Harness {
    let transport = Arc::new(MockTransport::new());
    let deps = Dependencies::new(
        SyncConfig::default(),
        transport.clone(),
        Arc::new(ManualScheduler::new()),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();
    Harness { deps, transport }
}

fn agents_response(status: &str) -> ApiResponse {
    ApiResponse::ok(json!([{ "name": "worker-7", "status": status }]))
}

fn no_content() -> ApiResponse {
    ApiResponse {
        status: 204,
        body: Value::Null,
    }
}

fn instance_json(version: u64, owner: &str) -> Value {
    json!({
        "id": INSTANCE_ID,
        "agent": "worker-7",
        "state": "running",
        "version": version,
        "attributes": { "owner": owner }
    })
}

fn instance_page(version: u64, owner: &str) -> ApiResponse {
    ApiResponse::ok(json!({
        "items": [instance_json(version, owner)],
        "total": 1,
        "current_page": 1,
        "page_size": 25
    }))
}

fn update_attributes_command(expected_version: u64) -> Command {
    Command::new(
        command_kinds::INSTANCE_UPDATE_ATTRIBUTES,
        json!({ "id": INSTANCE_ID, "attributes": { "owner": "sre" } }),
    )
    .with_expected_version(expected_version)
}

// ── Success path ─────────────────────────────────────────────────

#[tokio::test]
async fn pause_agent_refreshes_the_subscribed_list_once_after_the_mutation() {
    let harness = make_harness();
    harness.transport.enqueue(Ok(agents_response("online")));
    harness.transport.enqueue(Ok(no_content()));
    harness.transport.enqueue(Ok(agents_response("paused")));

    let query = Query::new(query_kinds::AGENT_LIST).with_param("filter", "online");
    let subscription = harness.deps.queries.subscribe(&query).await.unwrap();

    let command = Command::new(command_kinds::AGENT_PAUSE, json!({ "name": "worker-7" }));
    harness.deps.commands.trigger(&command).await.unwrap();

    let sent = harness.transport.sent();
    let paths: Vec<&str> = sent.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["agents", "agent/worker-7/pause", "agents"]);
    assert_eq!(sent[1].method, Method::Post);
    assert!(sent[1].body.is_none(), "pause sends an empty body");
    // The refetch re-runs the open subscription with its own params.
    assert_eq!(
        sent[2].query,
        vec![("filter".to_string(), "online".to_string())]
    );

    match subscription.remote_data().await {
        RemoteData::Success(ResourceSet::Agents(agents)) => {
            assert_eq!(agents[0].status, opsdeck_types::AgentStatus::Paused);
        }
        other => panic!("unexpected cache state: {other:?}"),
    }

    subscription.close().await;
}

#[tokio::test]
async fn without_a_subscription_the_declared_query_is_fetched() {
    let harness = make_harness();
    harness.transport.enqueue(Ok(no_content()));
    harness.transport.enqueue(Ok(agents_response("paused")));

    let command = Command::new(command_kinds::AGENT_PAUSE, json!({ "name": "worker-7" }));
    harness.deps.commands.trigger(&command).await.unwrap();

    let paths: Vec<String> = harness.transport.sent().iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, vec!["agent/worker-7/pause", "agents"]);

    let fingerprint = Query::new(query_kinds::AGENT_LIST).fingerprint();
    assert!(harness.deps.queries.state().get(&fingerprint).await.is_success());
}

#[tokio::test]
async fn a_failed_refetch_does_not_fail_the_command() {
    let harness = make_harness();
    harness.transport.enqueue(Ok(no_content()));
    harness
        .transport
        .enqueue(Err(SyncError::Network("socket closed".into())));

    let command = Command::new(command_kinds::AGENT_PAUSE, json!({ "name": "worker-7" }));
    let result = harness.deps.commands.trigger(&command).await;

    assert_eq!(result, Ok(()));
    // The stale list is marked failed until the next poll or retry.
    let fingerprint = Query::new(query_kinds::AGENT_LIST).fingerprint();
    assert!(harness.deps.queries.state().get(&fingerprint).await.is_failed());
}

#[tokio::test]
async fn delete_instance_refreshes_the_instance_list() {
    let harness = make_harness();
    harness.transport.enqueue(Ok(no_content()));
    harness.transport.enqueue(Ok(instance_page(1, "ops")));

    let command = Command::new(command_kinds::INSTANCE_DELETE, json!({ "id": INSTANCE_ID }));
    harness.deps.commands.trigger(&command).await.unwrap();

    let sent = harness.transport.sent();
    assert_eq!(sent[0].method, Method::Delete);
    assert_eq!(sent[0].path, format!("instance/{INSTANCE_ID}"));
    assert_eq!(sent[1].path, "instances");
}

#[tokio::test]
async fn promote_version_carries_the_expected_version_and_refreshes_the_package_list() {
    let harness = make_harness();
    harness.transport.enqueue(Ok(ApiResponse::ok(json!({
        "id": "v-42",
        "package": "billing",
        "number": "2.3.0",
        "state": "promoted",
        "version": 5
    }))));
    harness.transport.enqueue(Ok(ApiResponse::ok(json!([]))));

    let command = Command::new(
        command_kinds::VERSION_PROMOTE,
        json!({ "id": "v-42", "package": "billing" }),
    )
    .with_expected_version(4);
    harness.deps.commands.trigger(&command).await.unwrap();

    let sent = harness.transport.sent();
    assert_eq!(sent[0].path, "version/v-42/promote");
    assert_eq!(
        sent[0].query,
        vec![("current_version".to_string(), "4".to_string())]
    );
    assert_eq!(sent[1].path, "versions");
    assert_eq!(
        sent[1].query,
        vec![("package".to_string(), "billing".to_string())]
    );
}

#[tokio::test]
async fn echo_is_merged_into_subscribed_collections_without_a_refetch() {
    let harness = make_harness();
    harness.transport.enqueue(Ok(instance_page(1, "ops")));

    let query = Query::new(query_kinds::INSTANCE_LIST).with_param("currentPage", 1i64);
    let subscription = harness.deps.queries.subscribe(&query).await.unwrap();

    // PATCH echoes the updated instance; the detail refresh that
    // follows is a separate fetch of the detail slot.
    harness
        .transport
        .enqueue(Ok(ApiResponse::ok(instance_json(2, "sre"))));
    harness
        .transport
        .enqueue(Ok(ApiResponse::ok(instance_json(2, "sre"))));

    harness
        .deps
        .commands
        .trigger(&update_attributes_command(1))
        .await
        .unwrap();

    // The cached page was updated in place, not refetched.
    assert_eq!(harness.transport.sent_to("instances").len(), 1);
    match subscription.remote_data().await {
        RemoteData::Success(ResourceSet::Instances(page)) => {
            assert_eq!(page.items[0].version, 2);
            assert_eq!(page.items[0].attributes["owner"], "sre");
            assert_eq!(page.total, 1);
        }
        other => panic!("unexpected cache state: {other:?}"),
    }

    subscription.close().await;
}

// ── Conflicts ────────────────────────────────────────────────────

#[tokio::test]
async fn version_conflict_is_reported_and_the_owning_resource_reread() {
    let harness = make_harness();
    harness
        .transport
        .enqueue(Ok(ApiResponse::error(409, "instance moved on")));
    harness
        .transport
        .enqueue(Ok(ApiResponse::ok(instance_json(5, "ops"))));

    let result = harness
        .deps
        .commands
        .trigger(&update_attributes_command(3))
        .await;

    match result {
        Err(error) => assert!(error.is_conflict()),
        Ok(()) => panic!("conflicting write reported success"),
    }

    // The write is never retried on the caller's behalf.
    let patch_path = format!("instance/{INSTANCE_ID}/attributes");
    assert_eq!(harness.transport.sent_to(&patch_path).len(), 1);

    // The detail slot now holds the server's current state, so the
    // caller can redecide against version 5.
    let fingerprint = Query::new(query_kinds::INSTANCE_DETAIL)
        .with_param("id", INSTANCE_ID)
        .fingerprint();
    match harness.deps.queries.state().get(&fingerprint).await {
        RemoteData::Success(ResourceSet::Instance(instance)) => assert_eq!(instance.version, 5),
        other => panic!("unexpected cache state: {other:?}"),
    }
}

#[tokio::test]
async fn non_conflict_failures_do_not_trigger_a_reread() {
    let harness = make_harness();
    harness
        .transport
        .enqueue(Ok(ApiResponse::error(422, "owner is not editable")));

    let result = harness
        .deps
        .commands
        .trigger(&update_attributes_command(3))
        .await;

    assert!(matches!(
        result,
        Err(SyncError::Validation { status: 422, .. })
    ));
    assert_eq!(harness.transport.sent_count(), 1);
}

// ── Validation ───────────────────────────────────────────────────

#[tokio::test]
async fn malformed_payload_is_rejected_before_anything_is_sent() {
    let harness = make_harness();

    let command = Command::new(command_kinds::AGENT_PAUSE, json!({}));
    let result = harness.deps.commands.trigger(&command).await;

    assert!(matches!(
        result,
        Err(SyncError::Validation { status: 400, .. })
    ));
    assert_eq!(harness.transport.sent_count(), 0);
}

#[tokio::test]
async fn attribute_updates_require_an_expected_version() {
    let harness = make_harness();

    let command = Command::new(
        command_kinds::INSTANCE_UPDATE_ATTRIBUTES,
        json!({ "id": INSTANCE_ID, "attributes": { "owner": "sre" } }),
    );
    let result = harness.deps.commands.trigger(&command).await;

    assert!(matches!(
        result,
        Err(SyncError::Validation { status: 400, .. })
    ));
    assert_eq!(harness.transport.sent_count(), 0);
}

#[tokio::test]
async fn unknown_command_kind_is_a_resolution_error() {
    let harness = make_harness();
    let command = Command::new("no.such.kind", json!({}));
    let result = harness.deps.commands.trigger(&command).await;

    assert!(matches!(result, Err(SyncError::Resolution(_))));
    assert_eq!(harness.transport.sent_count(), 0);
}

// ── Wiring ───────────────────────────────────────────────────────

struct OrphanRefreshManager;

impl CommandManager for OrphanRefreshManager {
    fn kind(&self) -> &'static str {
        "ghost.exorcise"
    }

    fn refresh_kinds(&self) -> &'static [&'static str] {
        &["ghost.list"]
    }

    fn request(&self, _command: &Command) -> SyncResult<ApiRequest> {
        Ok(ApiRequest::post("ghosts"))
    }

    fn refreshes(&self, _command: &Command) -> Vec<Query> {
        vec![Query::new("ghost.list")]
    }
}

fn make_query_resolver(state: &StateHelper) -> Arc<QueryResolver> {
    Arc::new(
        QueryResolver::new(
            queries::builtin_managers(),
            Arc::new(MockTransport::new()),
            Arc::new(ManualScheduler::new()),
            state.clone(),
            SyncConfig::default(),
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn a_refresh_nobody_serves_fails_at_construction() {
    let state = StateHelper::new(Arc::new(MemoryStore::new()));
    let result = CommandResolver::new(
        vec![Arc::new(OrphanRefreshManager)],
        Arc::new(MockTransport::new()),
        make_query_resolver(&state),
        state,
    );
    assert!(matches!(result, Err(SyncError::Resolution(_))));
}

#[tokio::test]
async fn duplicate_command_kind_fails_at_construction() {
    let state = StateHelper::new(Arc::new(MemoryStore::new()));
    let result = CommandResolver::new(
        vec![Arc::new(PauseAgentManager), Arc::new(PauseAgentManager)],
        Arc::new(MockTransport::new()),
        make_query_resolver(&state),
        state,
    );
    assert!(matches!(result, Err(SyncError::Resolution(_))));
}

// ── Triggers ─────────────────────────────────────────────────────

#[tokio::test]
async fn get_trigger_fires_the_bound_command() {
    let harness = make_harness();
    harness.transport.enqueue(Ok(no_content()));
    harness.transport.enqueue(Ok(agents_response("paused")));

    let command = Command::new(command_kinds::AGENT_PAUSE, json!({ "name": "worker-7" }));
    let trigger = harness.deps.commands.get_trigger(command);
    assert_eq!(trigger.command().kind, command_kinds::AGENT_PAUSE);

    trigger.run().await.unwrap();
    assert_eq!(
        harness.transport.sent_to("agent/worker-7/pause").len(),
        1
    );
}
