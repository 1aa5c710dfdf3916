//! # TagKV
//!
//! A typed key-value persistence layer over an ordered byte store:
//! - Tagged values (int, float, str, dict, list, tuple) with type-checked reads
//! - Namespaces via `prefix:` key headers
//! - create / upsert / update semantics
//! - Bulk import with per-item outcome counts
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Bulk Importer (import_mapping,               │
//! │                  ingest_list, ingest_json_file)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Database<B>                             │
//! │           (CRUD, typed getters, autosync, close)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ KeyComposer │          │    Codec    │
//!   │ (prefix:key)│          │ (tag:body)  │
//!   └─────────────┘          └─────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │   Backend     │
//!               │ (Redb/Memory) │
//!               └───────────────┘
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use tagkv::{Config, Database};
//!
//! # fn main() -> tagkv::Result<()> {
//! let config = Config::builder().path("data.db").build();
//! Database::scoped(config, |db| {
//!     db.create("version", 1, None)?;
//!     db.set("units", "SI", Some("settings"))?;
//!     let version = db.get_int("version", None)?;
//!     assert_eq!(version, 1);
//!     Ok(())
//! })
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod key;
pub mod backend;
pub mod database;
pub mod import;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{TagKvError, Result};
pub use config::Config;
pub use backend::{Backend, MemoryBackend, RedbBackend};
pub use database::{Database, Keys};
pub use import::{ImportStats, IngestStats};
pub use value::{Value, ValueType};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TagKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
