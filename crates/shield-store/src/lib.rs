//! Shield store
//!
//! The controlling process and the shield extension exchange selections,
//! button configuration and the whitelist through a shared key-value store.
//! This crate provides:
//! - [`KeyValueStore`]: the store seam, with explicit synchronisation hooks
//! - [`MemoryStore`] and [`JsonFileStore`]: two implementations
//! - [`SelectionStore`]: typed access to the keys the engine cares about
#![warn(missing_docs)]

mod error;
mod file;
mod kv;
mod memory;
mod selections;

pub use error::{Error, Result};
pub use file::JsonFileStore;
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use selections::SelectionStore;
