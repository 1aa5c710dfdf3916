//! Shared test helpers

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use tagkv::backend::KeyScan;
use tagkv::{Backend, MemoryBackend, Result, TagKvError};

/// Handle for observing and steering a `RecordingBackend` after it has been
/// moved into a `Database`
#[derive(Clone, Default)]
pub struct FlushControl {
    flushes: Rc<Cell<usize>>,
    fail: Rc<Cell<bool>>,
}

impl FlushControl {
    /// Successful flushes so far
    pub fn flushes(&self) -> usize {
        self.flushes.get()
    }

    /// Make every following flush fail (or succeed again)
    pub fn fail_flushes(&self, fail: bool) {
        self.fail.set(fail);
    }
}

/// In-memory backend that counts flushes and can be told to fail them
pub struct RecordingBackend {
    inner: MemoryBackend,
    control: FlushControl,
}

impl RecordingBackend {
    pub fn new() -> (Self, FlushControl) {
        let control = FlushControl::default();
        let backend = Self {
            inner: MemoryBackend::new(),
            control: control.clone(),
        };
        (backend, control)
    }
}

impl Backend for RecordingBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<bool> {
        self.inner.delete(key)
    }

    fn scan(&self, prefix: &[u8]) -> Result<KeyScan<'_>> {
        self.inner.scan(prefix)
    }

    fn flush(&mut self) -> Result<()> {
        if self.control.fail.get() {
            return Err(TagKvError::Storage("disk full".to_string()));
        }
        self.control.flushes.set(self.control.flushes.get() + 1);
        self.inner.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn len(&self) -> Result<usize> {
        self.inner.len()
    }
}
