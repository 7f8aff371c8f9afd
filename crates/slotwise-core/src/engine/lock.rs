//! Per-key exclusive regions with bounded waits.
//!
//! `LockTable` maps each key (a provider or booking id) to its own async
//! mutex held in a `DashMap`, so operations on different keys never contend.
//! The `DashMap` guard is dropped before awaiting the mutex; only the cloned
//! `Arc` crosses the await.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use slotwise_types::error::SlotError;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of per-key async mutexes.
#[derive(Debug)]
pub struct LockTable<K: Eq + Hash> {
    kind: &'static str,
    timeout: Duration,
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Clone + Display,
{
    /// Create an empty table. `kind` names the resource in `Busy` errors.
    pub fn new(kind: &'static str, timeout: Duration) -> Self {
        Self {
            kind,
            timeout,
            locks: DashMap::new(),
        }
    }

    /// Acquire the exclusive region for `key`, waiting at most the table's
    /// timeout.
    pub async fn acquire(&self, key: &K) -> Result<OwnedMutexGuard<()>, SlotError> {
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        match tokio::time::timeout(self.timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => Err(SlotError::Busy {
                resource: format!("{} {key}", self.kind),
                waited_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    /// Drop the entry for `key` if nobody holds or waits on it.
    ///
    /// Waiters clone the `Arc` under the shard lock, so a count of one inside
    /// `remove_if` means the entry is idle.
    pub fn prune(&self, key: &K) -> bool {
        self.locks
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1)
            .is_some()
    }

    /// Number of keys with a live entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
