//! Data-synchronization core for the opsdeck console.
//!
//! Every page in the console reads server state the same way: it
//! declares a typed [`Query`](opsdeck_types::Query), the resolver
//! dispatches it to the manager for its kind, and the result lands in
//! a cache slot keyed by the query's fingerprint as an explicit
//! four-state [`RemoteData`](opsdeck_types::RemoteData) — so views
//! never guess whether data is loading, absent, present, or failed.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Scheduler**: cooperative repeating-timer registry driving
//!   continuous queries
//! - **StateHelper / Store**: the cache — fingerprint-keyed
//!   `RemoteData` slots with reactive listeners
//! - **QueryManager / QueryResolver**: per-kind fetch + decode,
//!   consumed one-shot or as a polling subscription
//! - **CommandManager / CommandResolver**: per-kind mutations with
//!   optimistic-concurrency conflict handling and declared dependent
//!   refreshes
//! - **Transport**: an injected request/response function; reqwest in
//!   production, a scripted mock in tests
//!
//! ## Sync process
//!
//! 1. **Subscribe**: immediate fetch, then a fixed-interval poll per
//!    fingerprint (ticks are skipped, not queued, while a fetch is in
//!    flight)
//! 2. **Write**: each response overwrites the slot atomically; stale
//!    responses for an unsubscribed fingerprint are discarded
//! 3. **Mutate**: commands execute first, then re-run the queries
//!    they made stale; a 409 conflict is surfaced distinctly and the
//!    owning resource re-read instead of retried
//!
//! # Example
//!
//! ```no_run
//! use opsdeck_sync::{ApiConfig, Dependencies, HttpTransport, MemoryStore, SyncConfig, TokioScheduler};
//! use opsdeck_types::{query_kinds, Query};
//! use std::sync::Arc;
//!
//! # async fn run() -> opsdeck_sync::SyncResult<()> {
//! let transport = Arc::new(HttpTransport::new(ApiConfig::default())?);
//! let deps = Dependencies::new(
//!     SyncConfig::default(),
//!     transport,
//!     Arc::new(TokioScheduler::new()),
//!     Arc::new(MemoryStore::new()),
//! )?;
//!
//! let agents = Query::new(query_kinds::AGENT_LIST).with_param("filter", "online");
//! let subscription = deps.queries.subscribe(&agents).await?;
//! # Ok(())
//! # }
//! ```

mod command;
mod error;
mod http;
mod query;
mod resolver;
mod scheduler;
mod state;
mod transport;

pub mod commands;
pub mod queries;

pub use command::{CommandEcho, CommandManager};
pub use error::{SyncError, SyncResult};
pub use http::{ApiConfig, HttpTransport, ENVIRONMENT_HEADER};
pub use query::QueryManager;
pub use resolver::{
    CommandResolver, CommandTrigger, QueryResolver, Subscription, SyncConfig,
};
pub use scheduler::{manual, Scheduler, SchedulerTask, TokioScheduler};
pub use state::{CachedData, MemoryStore, StateHelper, Store};
pub use transport::{mock, ApiRequest, ApiResponse, Method, Transport};

use std::sync::Arc;

/// The resolver pair every consuming surface receives by constructor
/// injection; no ambient or global lookup.
pub struct Dependencies {
    pub queries: Arc<QueryResolver>,
    pub commands: Arc<CommandResolver>,
}

impl Dependencies {
    /// Wires the built-in query and command catalogs over the given
    /// transport, scheduler and store. Fails fast on wiring bugs.
    pub fn new(
        config: SyncConfig,
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
        store: Arc<dyn Store>,
    ) -> SyncResult<Self> {
        Self::with_managers(
            config,
            transport,
            scheduler,
            store,
            queries::builtin_managers(),
            commands::builtin_managers(),
        )
    }

    /// Wires explicit manager sets; the seam tests and embedders use.
    pub fn with_managers(
        config: SyncConfig,
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
        store: Arc<dyn Store>,
        query_managers: Vec<Arc<dyn QueryManager>>,
        command_managers: Vec<Arc<dyn CommandManager>>,
    ) -> SyncResult<Self> {
        let state = StateHelper::new(store);
        let queries = Arc::new(QueryResolver::new(
            query_managers,
            transport.clone(),
            scheduler,
            state.clone(),
            config,
        )?);
        let commands = Arc::new(CommandResolver::new(
            command_managers,
            transport,
            queries.clone(),
            state,
        )?);
        Ok(Self { queries, commands })
    }
}
