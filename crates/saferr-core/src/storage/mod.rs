//! Durable client-side storage.
//!
//! This module provides:
//! - `KeyValueStore`: the string key-value contract persisted state is written through
//! - `FileStore`: a JSON file in the cache directory, replaced atomically on write
//! - `MemoryStore`: an in-process store for tests and ephemeral runs
//! - `SessionStorage`: the paired session record + raw token written and cleared together

pub mod file;
pub mod memory;
pub mod session;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::{SessionStorage, StoredSession, SESSION_KEY, TOKEN_KEY};

use anyhow::Result;

/// String key-value storage that survives process restarts.
///
/// Multi-entry writes and removals are applied as one operation so related
/// entries never diverge.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()>;

    fn remove_all(&self, keys: &[&str]) -> Result<()>;
}
