//! Per-request mutual exclusion

use crate::models::RequestId;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

/// Lock map keyed by request id.
///
/// Holding the lock for a request serializes the read-check-write of its
/// status. An entry lives only while some caller holds or waits on it, so
/// unknown ids and refused attempts leave nothing behind.
#[derive(Default)]
pub struct RequestLocks {
    locks: DashMap<RequestId, Arc<Mutex<()>>>,
}

impl RequestLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock of `id`
    pub fn with_lock<T>(&self, id: RequestId, f: impl FnOnce() -> T) -> T {
        // The map shard must not stay locked while waiting
        let lock = self.locks.entry(id).or_default().clone();
        let out = {
            // Guarded data is (); store commits are atomic on their own
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f()
        };
        drop(lock);
        // Only the map's own handle left: nobody holds or waits on it
        self.locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
        out
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
