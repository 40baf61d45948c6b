//! Query and command resolution.
//!
//! Resolvers are dispatch tables from `kind` to manager, wired once
//! at application start. Wiring mistakes — duplicate kinds, a command
//! declaring a refresh for a query kind nobody serves — fail at
//! construction time, never as a user-facing runtime state.
//!
//! Queries are consumed in two modes: a one-shot fetch, or a
//! continuous subscription that polls at a fixed interval until the
//! handle is closed. Commands have a single `trigger` entry point
//! that executes the mutation and then re-runs the queries it made
//! stale.

use crate::command::{CommandEcho, CommandManager};
use crate::error::{SyncError, SyncResult};
use crate::query::{run_fetch, QueryManager};
use crate::scheduler::{Scheduler, SchedulerTask};
use crate::state::{CachedData, StateHelper};
use crate::transport::Transport;
use opsdeck_types::{Command, Fingerprint, Query, QueryParams, RemoteData};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Tunables for the sync core.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fixed interval between polls of a continuous query. The first
    /// fetch is immediate; ticks that land while a fetch is in flight
    /// are skipped, not queued.
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

type ActiveQueries = Arc<Mutex<HashMap<Fingerprint, Query>>>;

/// Dispatch table from query kind to manager, plus the machinery for
/// one-shot and continuous consumption.
pub struct QueryResolver {
    managers: HashMap<String, Arc<dyn QueryManager>>,
    transport: Arc<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    state: StateHelper,
    config: SyncConfig,
    /// Fingerprint → query for every open subscription.
    active: ActiveQueries,
}

impl QueryResolver {
    /// Builds the resolver from the full manager set. Registering two
    /// managers under one kind is a wiring bug and fails here.
    pub fn new(
        managers: Vec<Arc<dyn QueryManager>>,
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
        state: StateHelper,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        let mut table: HashMap<String, Arc<dyn QueryManager>> = HashMap::new();
        for manager in managers {
            let kind = manager.kind().to_string();
            if table.insert(kind.clone(), manager).is_some() {
                return Err(SyncError::Resolution(format!(
                    "duplicate query manager for kind `{kind}`"
                )));
            }
        }
        Ok(Self {
            managers: table,
            transport,
            scheduler,
            state,
            config,
            active: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Whether a manager is registered for `kind`.
    #[must_use]
    pub fn has_kind(&self, kind: &str) -> bool {
        self.managers.contains_key(kind)
    }

    /// Read access to the cache for consumers that only observe.
    #[must_use]
    pub fn state(&self) -> &StateHelper {
        &self.state
    }

    fn manager_for(&self, kind: &str) -> SyncResult<Arc<dyn QueryManager>> {
        self.managers
            .get(kind)
            .cloned()
            .ok_or_else(|| SyncError::Resolution(format!("no query manager for kind `{kind}`")))
    }

    /// Fetches once through the matching manager, writes the result
    /// to the cache, and returns it.
    ///
    /// If a fetch for the same fingerprint is already outstanding the
    /// call does not issue a second one; it returns the current cache
    /// value and lets the in-flight result land.
    pub async fn fetch_once(&self, query: &Query) -> SyncResult<CachedData> {
        let manager = self.manager_for(&query.kind)?;
        let fingerprint = query.fingerprint();

        if matches!(self.state.get(&fingerprint).await, RemoteData::NotAsked) {
            self.state.set(&fingerprint, RemoteData::Loading).await;
        }
        if !self.state.begin_fetch(&fingerprint).await {
            debug!("fetch for {fingerprint} already in flight");
            return Ok(self.state.get(&fingerprint).await);
        }

        let result = run_fetch(&manager, &self.transport, &query.params).await;
        self.state.set(&fingerprint, result.clone()).await;
        self.state.finish_fetch(&fingerprint).await;
        Ok(result)
    }

    /// Starts a continuous subscription: one immediate fetch, then a
    /// scheduler task under the fingerprint id re-fetches with the
    /// same params every poll interval until the handle is closed.
    pub async fn subscribe(&self, query: &Query) -> SyncResult<Subscription> {
        let manager = self.manager_for(&query.kind)?;
        let fingerprint = query.fingerprint();

        self.state.observe(&fingerprint).await;
        self.active
            .lock()
            .await
            .insert(fingerprint.clone(), query.clone());
        if matches!(self.state.get(&fingerprint).await, RemoteData::NotAsked) {
            self.state.set(&fingerprint, RemoteData::Loading).await;
        }

        let task = poll_task(
            manager,
            self.transport.clone(),
            self.state.clone(),
            fingerprint.clone(),
            query.params.clone(),
        );
        task().await;
        self.scheduler
            .register(fingerprint.as_str(), self.config.poll_interval, task.clone())
            .await;

        Ok(Subscription {
            query: query.clone(),
            fingerprint,
            state: self.state.clone(),
            scheduler: self.scheduler.clone(),
            active: self.active.clone(),
            task,
            closed: AtomicBool::new(false),
        })
    }

    /// Re-runs the queries a command made stale: every open
    /// subscription of the query's kind is refetched once; with no
    /// subscription open, the declared query itself is fetched.
    pub(crate) async fn refresh(&self, query: &Query) -> SyncResult<()> {
        let manager = self.manager_for(&query.kind)?;
        let subscribed: Vec<Query> = self
            .active
            .lock()
            .await
            .values()
            .filter(|q| q.kind == query.kind)
            .cloned()
            .collect();

        if subscribed.is_empty() {
            self.fetch_once(query).await?;
            return Ok(());
        }

        for query in subscribed {
            let fingerprint = query.fingerprint();
            if !self.state.begin_fetch(&fingerprint).await {
                debug!("refresh of {fingerprint} skipped, fetch in flight");
                continue;
            }
            let result = run_fetch(&manager, &self.transport, &query.params).await;
            self.state.set_if_observed(&fingerprint, result).await;
            self.state.finish_fetch(&fingerprint).await;
        }
        Ok(())
    }

    /// Fingerprints of every open subscription.
    pub(crate) async fn active_fingerprints(&self) -> Vec<Fingerprint> {
        self.active.lock().await.keys().cloned().collect()
    }
}

/// Builds the repeating fetch for one fingerprint. Each invocation
/// re-checks the in-flight guard and writes through the
/// observed-fingerprint gate, so a tick that fires during a slow
/// response is skipped and a response that outlives its subscription
/// is discarded.
fn poll_task(
    manager: Arc<dyn QueryManager>,
    transport: Arc<dyn Transport>,
    state: StateHelper,
    fingerprint: Fingerprint,
    params: QueryParams,
) -> SchedulerTask {
    Arc::new(move || {
        let manager = manager.clone();
        let transport = transport.clone();
        let state = state.clone();
        let fingerprint = fingerprint.clone();
        let params = params.clone();
        Box::pin(async move {
            if !state.begin_fetch(&fingerprint).await {
                debug!("poll of {fingerprint} skipped, fetch in flight");
                return;
            }
            let result = run_fetch(&manager, &transport, &params).await;
            state.set_if_observed(&fingerprint, result).await;
            state.finish_fetch(&fingerprint).await;
        })
    })
}

/// Handle to a continuous query.
///
/// Closing the handle (explicitly, or by dropping it inside a tokio
/// runtime) removes its observer; when the last observer for the
/// fingerprint leaves, the polling task is unregistered and late
/// responses are discarded rather than written.
pub struct Subscription {
    query: Query,
    fingerprint: Fingerprint,
    state: StateHelper,
    scheduler: Arc<dyn Scheduler>,
    active: ActiveQueries,
    task: SchedulerTask,
    closed: AtomicBool,
}

impl Subscription {
    /// The query this subscription keeps fresh.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The cache slot this subscription observes.
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// The current cache value.
    pub async fn remote_data(&self) -> CachedData {
        self.state.get(&self.fingerprint).await
    }

    /// A reactive listener on the cache slot.
    pub async fn watch(&self) -> watch::Receiver<CachedData> {
        self.state.watch(&self.fingerprint).await
    }

    /// Forces an immediate extra fetch outside the normal interval,
    /// e.g. behind a user-facing "Retry" action after a failure. The
    /// in-flight guard still applies.
    pub async fn retry(&self) {
        (self.task)().await;
    }

    /// Ends the subscription. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.state.unobserve(&self.fingerprint).await {
            self.scheduler.unregister(self.fingerprint.as_str()).await;
            self.active.lock().await.remove(&self.fingerprint);
            debug!("released polling state for {}", self.fingerprint);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        // Best-effort cleanup when the handle is dropped un-closed;
        // needs a runtime to run the async teardown on.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let state = self.state.clone();
            let scheduler = self.scheduler.clone();
            let active = self.active.clone();
            let fingerprint = self.fingerprint.clone();
            handle.spawn(async move {
                if state.unobserve(&fingerprint).await {
                    scheduler.unregister(fingerprint.as_str()).await;
                    active.lock().await.remove(&fingerprint);
                }
            });
        }
    }
}

/// Dispatch table from command kind to manager, plus the single
/// `trigger` entry point.
pub struct CommandResolver {
    managers: HashMap<String, Arc<dyn CommandManager>>,
    transport: Arc<dyn Transport>,
    queries: Arc<QueryResolver>,
    state: StateHelper,
}

impl CommandResolver {
    /// Builds the resolver from the full manager set. Fails fast on
    /// duplicate kinds and on declared refreshes that no query
    /// manager serves.
    pub fn new(
        managers: Vec<Arc<dyn CommandManager>>,
        transport: Arc<dyn Transport>,
        queries: Arc<QueryResolver>,
        state: StateHelper,
    ) -> SyncResult<Self> {
        let mut table: HashMap<String, Arc<dyn CommandManager>> = HashMap::new();
        for manager in managers {
            for refresh_kind in manager.refresh_kinds() {
                if !queries.has_kind(refresh_kind) {
                    return Err(SyncError::Resolution(format!(
                        "command `{}` refreshes unknown query kind `{refresh_kind}`",
                        manager.kind()
                    )));
                }
            }
            let kind = manager.kind().to_string();
            if table.insert(kind.clone(), manager).is_some() {
                return Err(SyncError::Resolution(format!(
                    "duplicate command manager for kind `{kind}`"
                )));
            }
        }
        Ok(Self {
            managers: table,
            transport,
            queries,
            state,
        })
    }

    fn manager_for(&self, kind: &str) -> SyncResult<Arc<dyn CommandManager>> {
        self.managers
            .get(kind)
            .cloned()
            .ok_or_else(|| SyncError::Resolution(format!("no command manager for kind `{kind}`")))
    }

    /// Executes a command: the mutation first, then — only on success
    /// — the dependent query refreshes, in that order. The returned
    /// result reflects the mutation alone; a failed refetch logs a
    /// warning and leaves the cache stale until the next poll or
    /// manual retry.
    ///
    /// A version conflict (409) is reported as a distinguishable
    /// error and is never retried here; instead the owning resource
    /// is re-read so the caller can redecide against current state.
    pub async fn trigger(&self, command: &Command) -> SyncResult<()> {
        let manager = self.manager_for(&command.kind)?;
        let request = manager.request(command)?;

        let response = self.transport.send(request).await?;
        if response.is_success() {
            info!("command {} completed", command.kind);
            if let Some(echo) = manager.echo(&response.body) {
                self.merge_echo(&echo).await;
            }
            for query in manager.refreshes(command) {
                if let Err(err) = self.queries.refresh(&query).await {
                    warn!(
                        "refresh of `{}` after command {} failed: {err}",
                        query.kind, command.kind
                    );
                }
            }
            return Ok(());
        }

        let error = SyncError::from_status(response.status, response.error_message());
        if error.is_conflict() {
            info!(
                "command {} hit a version conflict, re-reading owning resource",
                command.kind
            );
            if let Some(query) = manager.conflict_refresh(command) {
                if let Err(err) = self.queries.refresh(&query).await {
                    warn!("conflict refresh of `{}` failed: {err}", query.kind);
                }
            }
        }
        Err(error)
    }

    /// Packages a command into a reusable trigger, for UI affordances
    /// that fire later (buttons, confirmation dialogs).
    #[must_use]
    pub fn get_trigger(self: &Arc<Self>, command: Command) -> CommandTrigger {
        CommandTrigger {
            resolver: self.clone(),
            command,
        }
    }

    /// Folds a server echo of the mutated resource into every cached
    /// collection an open subscription observes, without discarding
    /// the rest of the cached payload.
    async fn merge_echo(&self, echo: &CommandEcho) {
        for fingerprint in self.queries.active_fingerprints().await {
            let merged = self
                .state
                .merge(&fingerprint, |data| match echo {
                    CommandEcho::Instance(instance) => data.merge_instance(instance),
                    CommandEcho::Version(version) => data.merge_version(version),
                })
                .await;
            if merged {
                debug!("merged command echo into {fingerprint}");
            }
        }
    }
}

/// A command bound to its resolver, ready to fire.
pub struct CommandTrigger {
    resolver: Arc<CommandResolver>,
    command: Command,
}

impl CommandTrigger {
    /// Executes the command. See [`CommandResolver::trigger`].
    pub async fn run(&self) -> SyncResult<()> {
        self.resolver.trigger(&self.command).await
    }

    /// The command this trigger fires.
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }
}
