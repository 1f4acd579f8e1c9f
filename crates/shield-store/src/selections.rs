use std::{collections::BTreeMap, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use shield_config::Settings;
use shield_types::Selection;
use tracing::{debug, trace};

use crate::{Error, KeyValueStore, Result};

/// Typed view over the shared store.
///
/// Every read synchronises first; every write synchronises afterwards.
#[derive(Clone)]
pub struct SelectionStore {
    /// Underlying shared store.
    kv: Arc<dyn KeyValueStore>,
    /// Key names.
    settings: Arc<Settings>,
}

impl SelectionStore {
    /// Wrap a store using the key names in `settings`.
    pub fn new(kv: Arc<dyn KeyValueStore>, settings: Arc<Settings>) -> Self {
        Self { kv, settings }
    }

    /// Key names in use.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Synchronise, then read the raw value at `key`.
    pub fn read_raw(&self, key: &str) -> Result<Option<Value>> {
        self.kv.sync_before_read()?;
        let v = self.kv.get(key)?;
        trace!(key, found = v.is_some(), "store_read");
        Ok(v)
    }

    /// Synchronise, then read and decode the value at `key`.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_raw(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v).map(Some).map_err(|source| Error::Json {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Encode and write `value` at `key`, then synchronise.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let v = serde_json::to_value(value).map_err(|source| Error::Json {
            key: key.to_string(),
            source,
        })?;
        self.kv.set(key, v)?;
        self.kv.sync_after_write()?;
        trace!(key, "store_write");
        Ok(())
    }

    /// Force a round of synchronisation in both directions.
    pub fn sync(&self) -> Result<()> {
        self.kv.sync_after_write()?;
        self.kv.sync_before_read()
    }

    /// Every persisted selection, ordered by id.
    ///
    /// The map key is authoritative for a selection's id.
    pub fn selections(&self) -> Result<Vec<Selection>> {
        let map: BTreeMap<String, Selection> = self
            .read(&self.settings.selections_key)?
            .unwrap_or_default();
        debug!(count = map.len(), "selections_loaded");
        Ok(map
            .into_iter()
            .map(|(id, mut sel)| {
                sel.id = id;
                sel
            })
            .collect())
    }

    /// A single selection by id.
    pub fn selection(&self, id: &str) -> Result<Option<Selection>> {
        Ok(self.selections()?.into_iter().find(|s| s.id == id))
    }

    /// Insert or replace a selection.
    pub fn put_selection(&self, selection: &Selection) -> Result<()> {
        let key = self.settings.selections_key.clone();
        let mut map: BTreeMap<String, Selection> = self.read(&key)?.unwrap_or_default();
        map.insert(selection.id.clone(), selection.clone());
        self.write(&key, &map)
    }

    /// Current whitelist; empty when unset.
    pub fn whitelist(&self) -> Result<Selection> {
        Ok(self.read(&self.settings.whitelist_key)?.unwrap_or_default())
    }

    /// Replace the whitelist.
    pub fn set_whitelist(&self, whitelist: &Selection) -> Result<()> {
        self.write(&self.settings.whitelist_key, whitelist)
    }

    /// Current blocklist; empty when unset.
    pub fn blocklist(&self) -> Result<Selection> {
        Ok(self.read(&self.settings.blocklist_key)?.unwrap_or_default())
    }

    /// Replace the blocklist.
    pub fn set_blocklist(&self, blocklist: &Selection) -> Result<()> {
        self.write(&self.settings.blocklist_key, blocklist)
    }

    /// Whether block-all mode is on.
    pub fn block_all_enabled(&self) -> Result<bool> {
        Ok(self.read(&self.settings.block_all_key)?.unwrap_or(false))
    }

    /// Toggle block-all mode.
    pub fn set_block_all(&self, enabled: bool) -> Result<()> {
        self.write(&self.settings.block_all_key, &enabled)
    }
}
