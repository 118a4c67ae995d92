//! # Shared State Store
//!
//! A map from identifier to record shared between the application task and an
//! inbound consumer loop. Every operation runs under the same mutex, so a
//! [`values`](StateStore::values) snapshot never observes a write in progress.
//!
//! Records are stored behind `Arc`, which makes `get` and `values` cheap and
//! hands callers an immutable view: to change a record, build a replacement and
//! `upsert` it (or use [`upsert_with`](StateStore::upsert_with) to do the
//! read-merge-write under one lock).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Store handle shared across tasks.
pub type SharedStore<K, V> = Arc<StateStore<K, V>>;

#[derive(Debug)]
pub struct StateStore<K, V> {
    records: Mutex<BTreeMap<K, Arc<V>>>,
}

impl<K: Ord + Clone, V> StateStore<K, V> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
        }
    }

    /// Creates an empty store already wrapped for sharing.
    pub fn shared() -> SharedStore<K, V> {
        Arc::new(Self::new())
    }

    // A panic while holding the lock cannot leave a half-written entry behind
    // (inserts are a single map operation), so the poisoned guard is still valid.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<K, Arc<V>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or fully replaces the record for `id`, returning the previous one.
    pub fn upsert(&self, id: K, record: V) -> Option<Arc<V>> {
        self.lock().insert(id, Arc::new(record))
    }

    /// Builds the replacement for `id` from the current record (if any) and
    /// stores it, all under one lock acquisition.
    pub fn upsert_with<F>(&self, id: K, merge: F) -> Arc<V>
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let mut records = self.lock();
        let next = Arc::new(merge(records.get(&id).map(Arc::as_ref)));
        records.insert(id, next.clone());
        next
    }

    /// Replaces an existing record with `change(current)` under one lock.
    /// Returns `None`, leaving the store untouched, when `id` is absent.
    pub fn update<F>(&self, id: &K, change: F) -> Option<Arc<V>>
    where
        F: FnOnce(&V) -> V,
    {
        let mut records = self.lock();
        let slot = records.get_mut(id)?;
        let next = Arc::new(change(slot));
        *slot = next.clone();
        Some(next)
    }

    pub fn get(&self, id: &K) -> Option<Arc<V>> {
        self.lock().get(id).cloned()
    }

    /// Snapshot of all records, ordered by identifier.
    pub fn values(&self) -> Vec<Arc<V>> {
        self.lock().values().cloned().collect()
    }

    /// First record (in identifier order) matching `predicate`.
    pub fn find<P>(&self, predicate: P) -> Option<Arc<V>>
    where
        P: Fn(&V) -> bool,
    {
        self.lock().values().find(|record| predicate(record)).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<K: Ord + Clone, V> Default for StateStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
