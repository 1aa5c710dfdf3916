//! Database Module
//!
//! The typed handle over one open backend.
//!
//! ## Responsibilities
//! - Compose physical keys from namespace + logical key
//! - Encode values on write, decode (and type-check) on read
//! - Enforce create/update/upsert semantics
//! - Flush after every write when autosync is on
//! - Guarantee a final flush + close on every exit path

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::backend::{Backend, KeyScan, RedbBackend};
use crate::config::Config;
use crate::error::{Result, TagKvError};
use crate::key::KeyComposer;
use crate::value::{self, Value, ValueType};

/// Typed key-value handle
///
/// ## Lifecycle
///
/// A handle is open from construction until `close()` (or drop). Every
/// operation on a closed handle fails with `TagKvError::NotOpen`. Dropping
/// an open handle closes it; use `close()` or `scoped()` to observe the
/// result of the final flush.
///
/// ## Concurrency Model
///
/// One handle owns its backend exclusively. Writes take `&mut self`, so the
/// borrow checker rules out interleaving a write with a live `keys()` scan.
pub struct Database<B: Backend> {
    /// Handle configuration
    config: Config,

    /// Namespace-aware key builder
    keys: KeyComposer,

    /// Open backend; `None` once closed
    backend: Option<B>,
}

impl Database<RedbBackend> {
    /// Open (or create) the store file named by `config.path`
    pub fn open(config: Config) -> Result<Self> {
        let backend = RedbBackend::open(&config.path)?;
        Ok(Self::with_backend(backend, config))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified store file
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().path(path.as_ref()).build();
        Self::open(config)
    }

    /// Open the store file, run `f`, then close
    pub fn scoped<T, F>(config: Config, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        Self::open(config)?.run_scoped(f)
    }
}

impl<B: Backend> Database<B> {
    /// Wrap an already-open backend
    pub fn with_backend(backend: B, config: Config) -> Self {
        let keys = KeyComposer::new(config.default_prefix.clone());
        debug!(
            autosync = config.autosync,
            default_prefix = ?config.default_prefix,
            "database opened"
        );
        Self {
            config,
            keys,
            backend: Some(backend),
        }
    }

    /// Wrap `backend`, run `f`, then close
    pub fn scoped_with<T, F>(backend: B, config: Config, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        Self::with_backend(backend, config).run_scoped(f)
    }

    /// Run `f` and close the handle on every exit path
    ///
    /// An error from `f` takes precedence over an error from closing.
    fn run_scoped<T, F>(mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let outcome = f(&mut self);
        let closed = self.close();

        match outcome {
            Ok(value) => closed.map(|_| value),
            Err(e) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "close failed after scoped error");
                }
                Err(e)
            }
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush pending writes and release the backend
    ///
    /// Closing a closed handle is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut backend) = self.backend.take() else {
            return Ok(());
        };

        let flushed = backend.flush();
        let closed = backend.close();
        debug!("database closed");

        flushed.and(closed)
    }

    /// Force the backend to persist pending writes
    pub fn flush(&mut self) -> Result<()> {
        self.backend_mut()?.flush()
    }

    /// Whether the handle is still open
    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Insert a new key; fails if it already exists
    pub fn create(&mut self, key: &str, value: impl Into<Value>, prefix: Option<&str>) -> Result<()> {
        let physical = self.keys.compose(key, prefix);
        if self.backend()?.contains(&physical)? {
            return Err(TagKvError::DuplicateKey {
                key: key.to_string(),
            });
        }

        self.write_synced(&physical, &value.into())
    }

    /// Insert or overwrite a key
    pub fn set(&mut self, key: &str, value: impl Into<Value>, prefix: Option<&str>) -> Result<()> {
        let physical = self.keys.compose(key, prefix);
        self.write_synced(&physical, &value.into())
    }

    /// Overwrite an existing key; fails if it is missing
    pub fn update(&mut self, key: &str, value: impl Into<Value>, prefix: Option<&str>) -> Result<()> {
        let physical = self.keys.compose(key, prefix);
        if !self.backend()?.contains(&physical)? {
            return Err(TagKvError::NotFound {
                key: key.to_string(),
            });
        }

        self.write_synced(&physical, &value.into())
    }

    /// Get a value by key
    ///
    /// Returns `TagKvError::NotFound` when the key is absent.
    pub fn get(&self, key: &str, prefix: Option<&str>) -> Result<Value> {
        self.get_with(key, prefix, None, None)
    }

    /// Get a value, falling back to `default` when the key is absent
    pub fn get_or(&self, key: &str, prefix: Option<&str>, default: impl Into<Value>) -> Result<Value> {
        self.get_with(key, prefix, Some(default.into()), None)
    }

    /// General form of `get`
    ///
    /// - `default`: returned as-is (not type-checked) when the key is absent
    /// - `expected`: required native type of the stored value
    pub fn get_with(
        &self,
        key: &str,
        prefix: Option<&str>,
        default: Option<Value>,
        expected: Option<ValueType>,
    ) -> Result<Value> {
        let physical = self.keys.compose(key, prefix);

        let Some(raw) = self.backend()?.get(&physical)? else {
            return default.ok_or_else(|| TagKvError::NotFound {
                key: key.to_string(),
            });
        };

        match expected {
            Some(expected) => value::decode_typed(&raw, expected),
            None => value::decode(&raw),
        }
    }

    /// Remove a key, returning whether it existed
    ///
    /// With autosync on, a failed flush puts the removed value back.
    pub fn delete(&mut self, key: &str, prefix: Option<&str>) -> Result<bool> {
        let physical = self.keys.compose(key, prefix);
        let previous = if self.config.autosync {
            self.backend()?.get(&physical)?
        } else {
            None
        };

        let removed = self.backend_mut()?.delete(&physical)?;
        trace!(key, removed, "delete");

        if removed {
            if let Err(e) = self.after_write() {
                self.restore(&physical, previous.as_deref());
                return Err(e);
            }
        }
        Ok(removed)
    }

    /// Check whether a key exists
    pub fn exists(&self, key: &str, prefix: Option<&str>) -> Result<bool> {
        let physical = self.keys.compose(key, prefix);
        self.backend()?.contains(&physical)
    }

    /// Iterate logical keys in the namespace, in physical key order
    ///
    /// With no call-site or default prefix every key in the store is
    /// yielded verbatim.
    pub fn keys(&self, prefix: Option<&str>) -> Result<Keys<'_>> {
        let header = self.keys.namespace_header(prefix);
        let scan = self.backend()?.scan(&header)?;
        Ok(Keys {
            scan,
            composer: &self.keys,
            prefix: prefix.map(str::to_string),
        })
    }

    // =========================================================================
    // Typed Getters
    // =========================================================================

    pub fn get_int(&self, key: &str, prefix: Option<&str>) -> Result<i64> {
        match self.get_typed(key, prefix, None, ValueType::Int)? {
            Value::Int(n) => Ok(n),
            other => Err(mismatch(ValueType::Int, &other)),
        }
    }

    /// `get_int`, returning `default` when the key is absent
    pub fn get_int_or(&self, key: &str, prefix: Option<&str>, default: i64) -> Result<i64> {
        match self.get_typed(key, prefix, Some(Value::Int(default)), ValueType::Int)? {
            Value::Int(n) => Ok(n),
            other => Err(mismatch(ValueType::Int, &other)),
        }
    }

    pub fn get_float(&self, key: &str, prefix: Option<&str>) -> Result<f64> {
        match self.get_typed(key, prefix, None, ValueType::Float)? {
            Value::Float(f) => Ok(f),
            other => Err(mismatch(ValueType::Float, &other)),
        }
    }

    pub fn get_float_or(&self, key: &str, prefix: Option<&str>, default: f64) -> Result<f64> {
        match self.get_typed(key, prefix, Some(Value::Float(default)), ValueType::Float)? {
            Value::Float(f) => Ok(f),
            other => Err(mismatch(ValueType::Float, &other)),
        }
    }

    pub fn get_str(&self, key: &str, prefix: Option<&str>) -> Result<String> {
        match self.get_typed(key, prefix, None, ValueType::Str)? {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(ValueType::Str, &other)),
        }
    }

    pub fn get_str_or(&self, key: &str, prefix: Option<&str>, default: &str) -> Result<String> {
        match self.get_typed(key, prefix, Some(Value::from(default)), ValueType::Str)? {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(ValueType::Str, &other)),
        }
    }

    pub fn get_dict(&self, key: &str, prefix: Option<&str>) -> Result<BTreeMap<String, Value>> {
        match self.get_typed(key, prefix, None, ValueType::Dict)? {
            Value::Dict(map) => Ok(map),
            other => Err(mismatch(ValueType::Dict, &other)),
        }
    }

    pub fn get_dict_or(
        &self,
        key: &str,
        prefix: Option<&str>,
        default: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>> {
        match self.get_typed(key, prefix, Some(Value::Dict(default)), ValueType::Dict)? {
            Value::Dict(map) => Ok(map),
            other => Err(mismatch(ValueType::Dict, &other)),
        }
    }

    pub fn get_list(&self, key: &str, prefix: Option<&str>) -> Result<Vec<Value>> {
        match self.get_typed(key, prefix, None, ValueType::List)? {
            Value::List(items) => Ok(items),
            other => Err(mismatch(ValueType::List, &other)),
        }
    }

    pub fn get_list_or(
        &self,
        key: &str,
        prefix: Option<&str>,
        default: Vec<Value>,
    ) -> Result<Vec<Value>> {
        match self.get_typed(key, prefix, Some(Value::List(default)), ValueType::List)? {
            Value::List(items) => Ok(items),
            other => Err(mismatch(ValueType::List, &other)),
        }
    }

    pub fn get_tuple(&self, key: &str, prefix: Option<&str>) -> Result<Vec<Value>> {
        match self.get_typed(key, prefix, None, ValueType::Tuple)? {
            Value::Tuple(items) => Ok(items),
            other => Err(mismatch(ValueType::Tuple, &other)),
        }
    }

    pub fn get_tuple_or(
        &self,
        key: &str,
        prefix: Option<&str>,
        default: Vec<Value>,
    ) -> Result<Vec<Value>> {
        match self.get_typed(key, prefix, Some(Value::Tuple(default)), ValueType::Tuple)? {
            Value::Tuple(items) => Ok(items),
            other => Err(mismatch(ValueType::Tuple, &other)),
        }
    }

    fn get_typed(
        &self,
        key: &str,
        prefix: Option<&str>,
        default: Option<Value>,
        expected: ValueType,
    ) -> Result<Value> {
        self.get_with(key, prefix, default, Some(expected))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of entries in the whole store (all namespaces)
    pub fn len(&self) -> Result<usize> {
        self.backend()?.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // =========================================================================
    // Crate-internal Helpers (shared with the bulk importer)
    // =========================================================================

    pub(crate) fn key_composer(&self) -> &KeyComposer {
        &self.keys
    }

    pub(crate) fn backend(&self) -> Result<&B> {
        self.backend.as_ref().ok_or(TagKvError::NotOpen)
    }

    pub(crate) fn backend_mut(&mut self) -> Result<&mut B> {
        self.backend.as_mut().ok_or(TagKvError::NotOpen)
    }

    /// Encode and store without flushing
    ///
    /// Encoding happens before the backend is touched, so an unsupported
    /// value leaves the key unchanged.
    pub(crate) fn write_entry(&mut self, physical: &[u8], value: &Value) -> Result<()> {
        let payload = value::encode(value)?;
        self.backend_mut()?.put(physical, &payload)?;
        trace!(key = %String::from_utf8_lossy(physical), bytes = payload.len(), "put");
        Ok(())
    }

    /// Flush when autosync is on
    pub(crate) fn after_write(&mut self) -> Result<()> {
        if self.config.autosync {
            self.flush()?;
        }
        Ok(())
    }

    /// Store one entry and flush it under autosync
    ///
    /// If the flush fails the key is put back to its previous state, so the
    /// call either fully succeeds or leaves the key as it was.
    fn write_synced(&mut self, physical: &[u8], value: &Value) -> Result<()> {
        if !self.config.autosync {
            return self.write_entry(physical, value);
        }

        let previous = self.backend()?.get(physical)?;
        self.write_entry(physical, value)?;

        if let Err(e) = self.flush() {
            self.restore(physical, previous.as_deref());
            return Err(e);
        }
        Ok(())
    }

    /// Put back the value (or absence) a key had before a failed write
    fn restore(&mut self, physical: &[u8], previous: Option<&[u8]>) {
        let Ok(backend) = self.backend_mut() else {
            return;
        };

        let restored = match previous {
            Some(payload) => backend.put(physical, payload),
            None => backend.delete(physical).map(|_| ()),
        };
        if let Err(e) = restored {
            warn!(key = %String::from_utf8_lossy(physical), error = %e, "failed to roll back write");
        }
    }
}

impl<B: Backend> Drop for Database<B> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close database on drop");
        }
    }
}

fn mismatch(expected: ValueType, found: &Value) -> TagKvError {
    TagKvError::TypeMismatch {
        expected,
        actual: found.value_type(),
    }
}

// =============================================================================
// Key Iterator
// =============================================================================

/// Lazy iterator over logical keys, returned by `Database::keys`
///
/// Reflects the store at the time of the call; call `keys()` again to
/// restart.
pub struct Keys<'a> {
    scan: KeyScan<'a>,
    composer: &'a KeyComposer,
    /// Call-site prefix the scan was started with
    prefix: Option<String>,
}

impl Iterator for Keys<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let physical = match self.scan.next()? {
                Ok(physical) => physical,
                Err(e) => return Some(Err(e)),
            };
            let Some(logical) = self.composer.strip(&physical, self.prefix.as_deref()) else {
                continue;
            };
            return Some(String::from_utf8(logical.to_vec()).map_err(|e| {
                TagKvError::Decode(format!("Key is not UTF-8: {}", e))
            }));
        }
    }
}
