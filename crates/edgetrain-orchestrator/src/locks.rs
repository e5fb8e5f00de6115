//! Keyed mutual exclusion: one `Mutex<()>` per device or job id.

use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use dashmap::DashMap;

/// Lazily populated table of per-key locks.
///
/// The `DashMap` shard guard is dropped before a key's mutex is acquired,
/// so holding one key never blocks lookups of another.
#[derive(Debug, Default)]
pub struct LockTable {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(existing) = self.locks.get(key) {
            return Arc::clone(existing.value());
        }
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Run `f` while holding the lock for `key`, waiting if necessary.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(key);
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` only if the lock for `key` is free right now.
    pub fn try_with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> Option<T> {
        let lock = self.lock_for(key);
        let _guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some(f())
    }

    /// Drop the entry for `key` unless someone still holds or awaits it.
    pub fn release(&self, key: &str) {
        self.locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_lock_fails_while_held() {
        let table = LockTable::new();
        table.with_lock("job-1", || {
            assert!(table.try_with_lock("job-1", || ()).is_none());
            assert!(table.try_with_lock("job-2", || ()).is_some());
        });
        assert!(table.try_with_lock("job-1", || ()).is_some());
    }

    #[test]
    fn release_removes_idle_entries() {
        let table = LockTable::new();
        table.with_lock("dev-1", || ());
        assert_eq!(table.len(), 1);
        table.release("dev-1");
        assert!(table.is_empty());
    }

    #[test]
    fn release_keeps_held_entries() {
        let table = LockTable::new();
        table.with_lock("dev-1", || {
            table.release("dev-1");
            assert_eq!(table.len(), 1);
        });
    }
}
