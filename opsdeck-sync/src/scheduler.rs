//! Cooperative repeating-timer registry.
//!
//! Continuous queries are kept fresh by a scheduler task registered
//! under the query's fingerprint. The registry owns start/stop of the
//! periodic callbacks; the callbacks themselves never fail — query
//! managers funnel every outcome into the cache as `RemoteData`, so a
//! bad iteration leaves a `Failed` entry behind and the timer keeps
//! firing on schedule.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A repeating unit of work. Each invocation produces a fresh future.
pub type SchedulerTask = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A registry of repeating timers, keyed by task id.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Starts invoking `task` every `interval`. Re-registering an id
    /// replaces the existing timer rather than duplicating it; at
    /// most one task is active per id.
    async fn register(&self, id: &str, interval: Duration, task: SchedulerTask);

    /// Stops and removes the task. No-op on an unknown id.
    async fn unregister(&self, id: &str);

    /// Whether a task is currently registered under `id`.
    async fn is_registered(&self, id: &str) -> bool;
}

/// Production scheduler backed by tokio timers.
///
/// Each registered task gets its own spawned loop. A tick runs the
/// callback in a task of its own, so a panicking iteration is logged
/// and swallowed at the scheduler boundary and the timer survives.
#[derive(Default)]
pub struct TokioScheduler {
    tasks: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl TokioScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn register(&self, id: &str, interval: Duration, task: SchedulerTask) {
        let task_id = id.to_string();
        let loop_id = task_id.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The interval fires immediately; the caller already did
            // its first run, so consume that tick.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = tokio::spawn(task()).await {
                    warn!("scheduled task {loop_id} aborted an iteration: {err}");
                }
            }
        });

        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.insert(task_id, handle) {
            debug!("replacing scheduler task {id}");
            previous.abort();
        }
    }

    async fn unregister(&self, id: &str) {
        if let Some(handle) = self.tasks.lock().await.remove(id) {
            handle.abort();
        }
    }

    async fn is_registered(&self, id: &str) -> bool {
        self.tasks.lock().await.contains_key(id)
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        // Timers must not outlive the registry that owns them.
        if let Ok(tasks) = self.tasks.try_lock() {
            for handle in tasks.values() {
                handle.abort();
            }
        }
    }
}

/// A deterministic scheduler for tests.
pub mod manual {
    use super::*;

    /// Holds registered tasks without any real timers; tests drive
    /// the clock by calling [`execute_all`](ManualScheduler::execute_all),
    /// which fires every registered callback exactly once.
    #[derive(Default)]
    pub struct ManualScheduler {
        tasks: Mutex<HashMap<String, SchedulerTask>>,
    }

    impl ManualScheduler {
        /// Creates an empty scheduler.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Fires every registered callback once, awaiting each in
        /// registration-map order.
        pub async fn execute_all(&self) {
            let tasks: Vec<SchedulerTask> = self.tasks.lock().await.values().cloned().collect();
            for task in tasks {
                task().await;
            }
        }

        /// Fires a single task by id, if registered.
        pub async fn execute(&self, id: &str) {
            let task = self.tasks.lock().await.get(id).cloned();
            if let Some(task) = task {
                task().await;
            }
        }

        /// Number of registered tasks.
        pub async fn task_count(&self) -> usize {
            self.tasks.lock().await.len()
        }
    }

    #[async_trait]
    impl Scheduler for ManualScheduler {
        async fn register(&self, id: &str, _interval: Duration, task: SchedulerTask) {
            self.tasks.lock().await.insert(id.to_string(), task);
        }

        async fn unregister(&self, id: &str) {
            self.tasks.lock().await.remove(id);
        }

        async fn is_registered(&self, id: &str) -> bool {
            self.tasks.lock().await.contains_key(id)
        }
    }
}
