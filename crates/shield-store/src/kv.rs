use serde_json::Value;

use crate::Result;

/// A key-value store shared between processes.
///
/// Callers follow a flush-then-read discipline: call
/// [`sync_before_read`](Self::sync_before_read) before reading and
/// [`sync_after_write`](Self::sync_after_write) after writing. There is no
/// cross-process lock; concurrent writers are last-writer-wins.
pub trait KeyValueStore: Send + Sync {
    /// Pull in changes made by other processes.
    fn sync_before_read(&self) -> Result<()>;

    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a value.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Publish local writes so other processes observe them.
    fn sync_after_write(&self) -> Result<()>;
}
