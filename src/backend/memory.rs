//! In-memory backend
//!
//! BTreeMap-based store with no persistence. Flush and close are no-ops.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::Result;

use super::{Backend, KeyScan};

/// Ephemeral ordered store
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryBackend {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<bool> {
        Ok(self.data.remove(key).is_some())
    }

    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.data.contains_key(key))
    }

    fn scan(&self, prefix: &[u8]) -> Result<KeyScan<'_>> {
        // Stop at the first key past the prefix
        let bound = prefix.to_vec();
        Ok(Box::new(
            self.data
                .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(move |(k, _)| k.starts_with(&bound))
                .map(|(k, _)| Ok(k.clone())),
        ))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.data.len())
    }
}
