//! Backend Module
//!
//! The ordered byte store a `Database` is built on. The database never
//! touches files directly; it is handed a backend at construction time.
//!
//! ## Responsibilities
//! - get/put/delete by byte key (put overwrites)
//! - Ordered key iteration bounded by a key prefix
//! - Explicit flush to durable storage and close
//!
//! ## Implementations
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────┐
//! │ MemoryBackend    │ BTreeMap, nothing persisted              │
//! ├──────────────────┼──────────────────────────────────────────┤
//! │ RedbBackend      │ redb file, one table `entries`           │
//! │                  │   put/delete: one non-durable commit     │
//! │                  │   flush: durable commit of prior writes  │
//! └──────────────────┴──────────────────────────────────────────┘
//! ```

mod memory;
mod redb;

pub use self::memory::MemoryBackend;
pub use self::redb::RedbBackend;

use crate::error::Result;

/// Iterator over physical keys in ascending byte order
pub type KeyScan<'a> = Box<dyn Iterator<Item = Result<Vec<u8>>> + 'a>;

/// An ordered byte-key → byte-value store
pub trait Backend {
    /// Get the value stored under `key`
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or overwrite `key`
    ///
    /// A failed put leaves the key unchanged.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`, returning whether it existed
    fn delete(&mut self, key: &[u8]) -> Result<bool>;

    /// Check whether `key` exists
    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Iterate keys starting with `prefix` (empty prefix = all keys)
    fn scan(&self, prefix: &[u8]) -> Result<KeyScan<'_>>;

    /// Persist pending writes
    fn flush(&mut self) -> Result<()>;

    /// Flush and release underlying resources
    fn close(&mut self) -> Result<()>;

    /// Number of stored entries
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
