//! Bulk import
//!
//! Insert-or-update over batches of entries with per-outcome counts.
//!
//! Items are applied in iteration order with no cross-item atomicity: an
//! error partway through leaves earlier items written. With autosync on, the
//! batch is flushed once at the end rather than after every item.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::backend::Backend;
use crate::database::Database;
use crate::error::{Result, TagKvError};
use crate::value::Value;

/// Counts returned by `import_mapping`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl ImportStats {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.skipped
    }
}

/// Counts returned by `ingest_list`
///
/// Each item lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped_existing: usize,
    pub missing_key: usize,
}

impl IngestStats {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.skipped_existing + self.missing_key
    }
}

/// What happened to one item
enum Outcome {
    Inserted,
    Updated,
    Skipped,
}

impl<B: Backend> Database<B> {
    /// Import key → value pairs
    pub fn import_mapping<I, K, V>(
        &mut self,
        entries: I,
        prefix: Option<&str>,
        overwrite: bool,
    ) -> Result<ImportStats>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        // An empty batch on a closed handle still fails
        self.backend()?;
        let mut stats = ImportStats::default();

        for (key, value) in entries {
            match self.apply(key.as_ref(), &value.into(), prefix, overwrite)? {
                Outcome::Inserted => stats.inserted += 1,
                Outcome::Updated => stats.updated += 1,
                Outcome::Skipped => stats.skipped += 1,
            }
        }

        self.after_write()?;
        debug!(?stats, "import_mapping finished");
        Ok(stats)
    }

    /// Store each structured item under the value of its `key_field`
    ///
    /// String fields are used verbatim and every other field value is
    /// stringified (see `item_key`). Only items without the field, including
    /// items that are not dicts, count as `missing_key` and are not written.
    pub fn ingest_list<I>(
        &mut self,
        items: I,
        key_field: &str,
        prefix: Option<&str>,
        overwrite: bool,
    ) -> Result<IngestStats>
    where
        I: IntoIterator<Item = Value>,
    {
        self.backend()?;
        let mut stats = IngestStats::default();

        for item in items {
            let Some(field) = item.field(key_field) else {
                stats.missing_key += 1;
                continue;
            };
            let key = item_key(field)?;

            match self.apply(&key, &item, prefix, overwrite)? {
                Outcome::Inserted => stats.inserted += 1,
                Outcome::Updated => stats.updated += 1,
                Outcome::Skipped => stats.skipped_existing += 1,
            }
        }

        self.after_write()?;
        debug!(?stats, key_field, "ingest_list finished");
        Ok(stats)
    }

    /// Load a JSON array of objects from `path` and ingest it
    pub fn ingest_json_file(
        &mut self,
        path: impl AsRef<Path>,
        key_field: &str,
        prefix: Option<&str>,
        overwrite: bool,
    ) -> Result<IngestStats> {
        let bytes = fs::read(path.as_ref())?;
        let rows = match serde_json::from_slice::<serde_json::Value>(&bytes)? {
            serde_json::Value::Array(rows) => rows,
            _ => {
                return Err(TagKvError::Decode(format!(
                    "{}: expected a JSON array of objects",
                    path.as_ref().display()
                )))
            }
        };

        self.ingest_list(rows.into_iter().map(Value::from), key_field, prefix, overwrite)
    }

    /// Insert, overwrite or skip one entry (no flush)
    fn apply(
        &mut self,
        key: &str,
        value: &Value,
        prefix: Option<&str>,
        overwrite: bool,
    ) -> Result<Outcome> {
        let physical = self.key_composer().compose(key, prefix);
        let exists = self.backend()?.contains(&physical)?;

        if exists && !overwrite {
            return Ok(Outcome::Skipped);
        }

        self.write_entry(&physical, value)?;
        Ok(if exists {
            Outcome::Updated
        } else {
            Outcome::Inserted
        })
    }
}

/// Render a key field as a logical key
///
/// Scalars use Python-style text (`True`, `None`, `235.0`); structured
/// fields become compact JSON.
fn item_key(field: &Value) -> Result<String> {
    Ok(match field {
        Value::Str(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => format!("{:?}", f),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        Value::Dict(_) | Value::List(_) | Value::Tuple(_) => {
            serde_json::to_string(&field.to_json()?)?
        }
    })
}
