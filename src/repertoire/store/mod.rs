//! # Storage Layer
//!
//! Persistence is a flat, string-keyed store read synchronously, the same shape
//! as browser local storage. The [`KeyValueStore`] trait is that contract;
//! everything above it only ever sees strings going in and out.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: Production storage, one `store.json` file holding every key
//! - [`memory::InMemoryStore`]: In-memory storage for testing
//!
//! ## Layout
//!
//! ```text
//! <data dir>/
//! └── store.json          # { "chessOpenings": "<json>", "boardTheme": "blue", ... }
//! ```
//!
//! Opening records live under a single namespace key as one serialized JSON
//! object keyed by store key. [`openings::OpeningStore`] owns that
//! (de)serialization and a short read cache on top of any backend.

use crate::error::Result;

pub mod fs;
pub mod memory;
pub mod openings;

/// Abstract interface for the flat key-value backend.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: String) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// Removes every key.
    fn clear(&mut self) -> Result<()>;

    fn keys(&self) -> Result<Vec<String>>;

    /// Approximate serialized size of the whole store, in bytes.
    fn total_size(&self) -> Result<usize> {
        let mut total = 0;
        for key in self.keys()? {
            let value_len = self.get(&key)?.map(|v| v.len()).unwrap_or(0);
            total += key.len() + value_len;
        }
        Ok(total)
    }
}
