//! Persistent session store.
//!
//! This module provides:
//! - `SessionStore`: the key/value abstraction every component reads and
//!   the session manager alone writes
//! - `FileStore`: JSON-file-backed store that survives restarts
//! - `MemoryStore`: in-memory store for tests and ephemeral runs
//!
//! Values are plain strings; a missing key is a valid, expected state.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use anyhow::Result;

/// Store key names. These are the on-disk layout, so renaming one is a
/// breaking change for existing session files.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER_ID: &str = "userId";
    pub const USERNAME: &str = "username";
    pub const LAST_VISITED_PATH: &str = "lastVisitedPath";
}

/// Process-wide key/value store for session data.
///
/// Reads are infallible: a key that is missing or unreadable is simply
/// absent. Writes report IO failures to the caller.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
