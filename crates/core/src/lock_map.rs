//! Keyed async locks for serializing work on the same key

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

/// A map of per-key async locks.
///
/// Entries no one holds anymore are pruned on the next acquisition, so
/// the map's size tracks the keys currently in use rather than every key
/// ever seen.
pub(crate) struct LockMap<K> {
    locks: StdMutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash> LockMap<K> {
    pub(crate) fn new() -> Self {
        Self { locks: StdMutex::new(HashMap::new()) }
    }

    /// Return the lock for `key`, creating it on first use.
    pub(crate) fn acquire(&self, key: K) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}
