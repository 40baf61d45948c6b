//! Cache state tracking.
//!
//! The cache is the only shared mutable resource in the sync core.
//! [`Store`] is the contract with the application's central key→value
//! store; [`StateHelper`] layers the sync core's bookkeeping on top:
//! in-flight guards (at most one outstanding request per fingerprint)
//! and observer counts (stale responses for an unobserved fingerprint
//! are discarded, never written over a newer entry).

use crate::error::SyncError;
use async_trait::async_trait;
use opsdeck_types::{Fingerprint, RemoteData, ResourceSet};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::debug;

/// The value stored per cache slot.
pub type CachedData = RemoteData<SyncError, ResourceSet>;

/// Contract with the central application store.
///
/// The store is created once per session and cleared on logout/reset;
/// the sync core only ever dispatches whole `RemoteData` values into
/// it and reads them back.
#[async_trait]
pub trait Store: Send + Sync {
    /// Overwrites the slot for a fingerprint and wakes its listeners.
    async fn dispatch(&self, fingerprint: &Fingerprint, data: CachedData);

    /// Reads the current value; `NotAsked` if never written.
    async fn read(&self, fingerprint: &Fingerprint) -> CachedData;

    /// A reactive listener for a fingerprint's slot.
    async fn watch(&self, fingerprint: &Fingerprint) -> watch::Receiver<CachedData>;
}

/// In-memory store over tokio watch channels.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<Fingerprint, watch::Sender<CachedData>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every slot. Session reset.
    pub async fn clear(&self) {
        self.slots.write().await.clear();
    }

    async fn slot(&self, fingerprint: &Fingerprint) -> watch::Sender<CachedData> {
        if let Some(sender) = self.slots.read().await.get(fingerprint) {
            return sender.clone();
        }
        let mut slots = self.slots.write().await;
        slots
            .entry(fingerprint.clone())
            .or_insert_with(|| watch::channel(CachedData::NotAsked).0)
            .clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn dispatch(&self, fingerprint: &Fingerprint, data: CachedData) {
        self.slot(fingerprint).await.send_replace(data);
    }

    async fn read(&self, fingerprint: &Fingerprint) -> CachedData {
        match self.slots.read().await.get(fingerprint) {
            Some(sender) => sender.borrow().clone(),
            None => CachedData::NotAsked,
        }
    }

    async fn watch(&self, fingerprint: &Fingerprint) -> watch::Receiver<CachedData> {
        self.slot(fingerprint).await.subscribe()
    }
}

/// The sync core's adapter over the store.
///
/// All cache traffic goes through one of these; clones share the same
/// bookkeeping. Writes are last-write-wins per fingerprint and atomic
/// relative to reads — each mutation is a single `dispatch`.
#[derive(Clone)]
pub struct StateHelper {
    store: Arc<dyn Store>,
    in_flight: Arc<Mutex<HashSet<Fingerprint>>>,
    observers: Arc<Mutex<HashMap<Fingerprint, usize>>>,
    /// Serializes read-modify-write merges; plain sets don't take it.
    merge_lock: Arc<Mutex<()>>,
}

impl StateHelper {
    /// Wraps a store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            observers: Arc::new(Mutex::new(HashMap::new())),
            merge_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current value for a fingerprint; `NotAsked` if never written.
    pub async fn get(&self, fingerprint: &Fingerprint) -> CachedData {
        self.store.read(fingerprint).await
    }

    /// Reactive listener for a fingerprint.
    pub async fn watch(&self, fingerprint: &Fingerprint) -> watch::Receiver<CachedData> {
        self.store.watch(fingerprint).await
    }

    /// Overwrites the slot unconditionally.
    pub async fn set(&self, fingerprint: &Fingerprint, data: CachedData) {
        self.store.dispatch(fingerprint, data).await;
    }

    /// Overwrites the slot only while the fingerprint is observed.
    ///
    /// The continuous-mode write path: a response that arrives after
    /// the last subscriber left (unsubscribe, or a param change that
    /// moved the subscription to a new fingerprint) is dropped here.
    /// Returns whether the write was applied.
    pub async fn set_if_observed(&self, fingerprint: &Fingerprint, data: CachedData) -> bool {
        if !self.is_observed(fingerprint).await {
            debug!("dropping stale response for unobserved {fingerprint}");
            return false;
        }
        self.store.dispatch(fingerprint, data).await;
        true
    }

    /// Updates a single item inside a cached `Success` collection
    /// without discarding the rest of the payload. The closure runs
    /// under the merge lock, so the read-modify-write is atomic
    /// relative to other merges. Returns whether a `Success` entry
    /// was present and rewritten.
    pub async fn merge(
        &self,
        fingerprint: &Fingerprint,
        apply: impl FnOnce(&mut ResourceSet) -> bool,
    ) -> bool {
        let _guard = self.merge_lock.lock().await;
        match self.store.read(fingerprint).await {
            RemoteData::Success(mut data) => {
                if !apply(&mut data) {
                    return false;
                }
                self.store
                    .dispatch(fingerprint, RemoteData::Success(data))
                    .await;
                true
            }
            _ => false,
        }
    }

    // ── In-flight bookkeeping ────────────────────────────────────

    /// Claims the in-flight slot for a fingerprint. Returns `false`
    /// when a fetch is already outstanding — the caller skips its
    /// tick instead of queueing, bounding requests per fingerprint
    /// to one.
    pub async fn begin_fetch(&self, fingerprint: &Fingerprint) -> bool {
        self.in_flight.lock().await.insert(fingerprint.clone())
    }

    /// Releases the in-flight slot.
    pub async fn finish_fetch(&self, fingerprint: &Fingerprint) {
        self.in_flight.lock().await.remove(fingerprint);
    }

    // ── Observer bookkeeping ─────────────────────────────────────

    /// Registers a continuous-mode observer for a fingerprint.
    pub async fn observe(&self, fingerprint: &Fingerprint) {
        *self
            .observers
            .lock()
            .await
            .entry(fingerprint.clone())
            .or_insert(0) += 1;
    }

    /// Removes one observer. Returns `true` when the last observer
    /// left and the fingerprint's polling state should be released.
    pub async fn unobserve(&self, fingerprint: &Fingerprint) -> bool {
        let mut observers = self.observers.lock().await;
        match observers.get_mut(fingerprint) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                observers.remove(fingerprint);
                true
            }
            None => false,
        }
    }

    /// Whether any continuous subscription observes the fingerprint.
    pub async fn is_observed(&self, fingerprint: &Fingerprint) -> bool {
        self.observers.lock().await.contains_key(fingerprint)
    }
}
