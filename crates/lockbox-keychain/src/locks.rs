//! Per-name mutual exclusion for store backends.
//!
//! A save is a delete followed by an insert; holding the name's lock across
//! both keeps a concurrent `load` from observing the gap. Entries live only
//! while some caller holds or waits on them, so the table stays bounded by
//! the number of in-flight operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct NameLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `name`.
    pub fn with<T>(&self, name: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(name);
        let out = {
            // the guarded value is `()`, so a poisoned lock carries no torn state
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(name, lock);
        out
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the table entry once no other caller holds a handle to it.
    fn release(&self, name: &str, lock: Arc<Mutex<()>>) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // handles are cloned and dropped only under the table lock, so one in
        // the table plus ours means nobody else holds or waits on it
        if Arc::strong_count(&lock) == 2 {
            table.remove(name);
        }
        drop(lock);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
