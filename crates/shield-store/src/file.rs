use std::{
    fs, io,
    path::PathBuf,
};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::trace;

use crate::{Error, KeyValueStore, Result};

/// Store backed by a single JSON object on disk.
///
/// Reads are served from an in-memory copy that is reloaded on
/// [`sync_before_read`](KeyValueStore::sync_before_read). Writes land in the
/// copy and are written out, via a temp file and rename, on
/// [`sync_after_write`](KeyValueStore::sync_after_write).
pub struct JsonFileStore {
    /// Backing file.
    path: PathBuf,
    /// Cached contents plus a dirty flag for unpublished writes.
    state: Mutex<FileState>,
}

/// Mutable state guarded by the store's lock.
#[derive(Default)]
struct FileState {
    /// Last loaded or locally modified contents.
    map: Map<String, Value>,
    /// True when `map` has writes not yet on disk.
    dirty: bool,
}

impl JsonFileStore {
    /// Open a store at `path`. The file is created lazily on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            state: Mutex::new(FileState::default()),
        };
        store.sync_before_read()?;
        Ok(store)
    }

    /// Load the file, treating a missing file as an empty store.
    fn load(&self) -> Result<Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(Error::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::Sync(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
            Err(source) => Err(Error::Json {
                key: self.path.display().to_string(),
                source,
            }),
        }
    }

    /// Write `map` to disk atomically.
    fn persist(&self, map: &Map<String, Value>) -> Result<()> {
        let io_err = |source| Error::Io {
            path: self.path.clone(),
            source,
        };
        let text = serde_json::to_string_pretty(map).map_err(|source| Error::Json {
            key: self.path.display().to_string(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        trace!(path = %self.path.display(), keys = map.len(), "store_persist");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn sync_before_read(&self) -> Result<()> {
        let mut st = self.state.lock();
        if st.dirty {
            self.persist(&st.map)?;
            st.dirty = false;
        }
        st.map = self.load()?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.state.lock().map.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut st = self.state.lock();
        st.map.insert(key.to_string(), value);
        st.dirty = true;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut st = self.state.lock();
        if st.map.remove(key).is_some() {
            st.dirty = true;
        }
        Ok(())
    }

    fn sync_after_write(&self) -> Result<()> {
        let mut st = self.state.lock();
        if st.dirty {
            self.persist(&st.map)?;
            st.dirty = false;
        }
        Ok(())
    }
}
