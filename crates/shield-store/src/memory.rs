use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use serde_json::Value;

use crate::{Error, KeyValueStore, Result};

/// In-process store, used by tests and embedders that own persistence.
#[derive(Default)]
pub struct MemoryStore {
    /// Stored values.
    map: Mutex<BTreeMap<String, Value>>,
    /// When set, every operation fails with [`Error::Unavailable`].
    unavailable: AtomicBool,
    /// Number of sync calls observed (both directions).
    syncs: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a store outage.
    pub fn set_unavailable(&self, v: bool) {
        self.unavailable.store(v, Ordering::SeqCst);
    }

    /// Total sync calls made against this store.
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }

    /// Fail when an outage is being simulated.
    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn sync_before_read(&self) -> Result<()> {
        self.check()?;
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.check()?;
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.check()?;
        self.map.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.map.lock().remove(key);
        Ok(())
    }

    fn sync_after_write(&self) -> Result<()> {
        self.check()?;
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn set_get_remove() {
        let s = MemoryStore::new();
        s.set("k", json!(1)).unwrap();
        assert_eq!(s.get("k").unwrap(), Some(json!(1)));
        s.remove("k").unwrap();
        s.remove("k").unwrap();
        assert_eq!(s.get("k").unwrap(), None);
    }

    #[test]
    fn outage_fails_every_operation() {
        let s = MemoryStore::new();
        s.set_unavailable(true);
        assert!(matches!(s.sync_before_read(), Err(Error::Unavailable(_))));
        assert!(s.get("k").is_err());
        assert!(s.set("k", json!(1)).is_err());
        s.set_unavailable(false);
        assert!(s.get("k").unwrap().is_none());
    }
}
