//! Redb-backed backend
//!
//! Entries live in one redb table keyed by raw physical key bytes. Each put
//! or delete commits its own write transaction with `Durability::None`: the
//! change is atomic and visible to later reads but not yet on disk. `flush`
//! commits an empty `Durability::Immediate` transaction, which makes every
//! earlier non-durable commit durable.

use std::path::{Path, PathBuf};

use ::redb::{
    Database as Store, Durability, ReadOnlyTable, ReadableTableMetadata, Table, TableDefinition,
};
use tracing::debug;

use crate::error::{Result, TagKvError};

use super::{Backend, KeyScan};

/// Physical key → tagged payload
const ENTRIES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("entries");

type Entries<'txn> = Table<'txn, &'static [u8], &'static [u8]>;

/// Ordered store persisted in a redb file
pub struct RedbBackend {
    /// Store file path
    path: PathBuf,
    /// Open store; `None` once closed
    store: Option<Store>,
    /// Non-durable commits since the last flush
    dirty: bool,
}

impl RedbBackend {
    /// Open a store file, creating it if absent
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Store::create(&path)?;

        // Read transactions can only open a table that exists
        let txn = store.begin_write()?;
        txn.open_table(ENTRIES)?;
        txn.commit()?;

        debug!(path = %path.display(), "opened store");

        Ok(Self {
            path,
            store: Some(store),
            dirty: false,
        })
    }

    /// Get the store file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are writes not yet flushed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn store(&self) -> Result<&Store> {
        self.store.as_ref().ok_or(TagKvError::NotOpen)
    }

    fn read_entries(&self) -> Result<ReadOnlyTable<&'static [u8], &'static [u8]>> {
        let txn = self.store()?.begin_read()?;
        Ok(txn.open_table(ENTRIES)?)
    }

    /// Run `op` in its own write transaction and commit it
    ///
    /// Nothing is applied when `op` or the commit fails.
    fn write<T>(&mut self, op: impl FnOnce(&mut Entries<'_>) -> Result<T>) -> Result<T> {
        let mut txn = self.store()?.begin_write()?;
        txn.set_durability(Durability::None);

        let out = {
            let mut entries = txn.open_table(ENTRIES)?;
            op(&mut entries)?
        };

        txn.commit()?;
        self.dirty = true;
        Ok(out)
    }
}

impl Backend for RedbBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let entries = self.read_entries()?;
        let value = entries.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(|entries| {
            entries.insert(key, value)?;
            Ok(())
        })
    }

    fn delete(&mut self, key: &[u8]) -> Result<bool> {
        self.write(|entries| Ok(entries.remove(key)?.is_some()))
    }

    fn scan(&self, prefix: &[u8]) -> Result<KeyScan<'_>> {
        let range = self.read_entries()?.range(prefix..)?;

        // Stop at the first key past the prefix
        let bound = prefix.to_vec();
        Ok(Box::new(
            range
                .map(|entry| {
                    entry
                        .map(|(key, _)| key.value().to_vec())
                        .map_err(TagKvError::from)
                })
                .take_while(move |entry| match entry {
                    Ok(key) => key.starts_with(&bound),
                    Err(_) => true,
                }),
        ))
    }

    fn flush(&mut self) -> Result<()> {
        let store = self.store()?;
        if !self.dirty {
            return Ok(());
        }

        let mut txn = store.begin_write()?;
        txn.set_durability(Durability::Immediate);
        txn.commit()?;
        self.dirty = false;

        debug!(path = %self.path.display(), "flushed store");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.store.is_none() {
            return Ok(());
        }

        let flushed = self.flush();
        self.store = None;
        flushed
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read_entries()?.len()? as usize)
    }
}
