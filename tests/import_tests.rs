//! Tests for bulk import
//!
//! These tests verify:
//! - import_mapping insert/update/skip accounting
//! - ingest_list key extraction and missing_key accounting
//! - ingest_json_file loading
//! - Counts always sum to the number of items

mod common;

use std::collections::BTreeMap;
use std::fs;

use common::RecordingBackend;
use tagkv::{
    Config, Database, ImportStats, IngestStats, MemoryBackend, RedbBackend, TagKvError, Value,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_memory_db() -> Database<MemoryBackend> {
    Database::with_backend(MemoryBackend::new(), Config::default())
}

fn steel(id: Option<&str>, fy: Value) -> Value {
    let mut map = BTreeMap::new();
    if let Some(id) = id {
        map.insert("id".to_string(), Value::from(id));
    }
    map.insert("fy".to_string(), fy);
    Value::Dict(map)
}

// =============================================================================
// import_mapping Tests
// =============================================================================

#[test]
fn test_import_mapping_into_empty_store() {
    let mut db = setup_memory_db();

    let stats = db
        .import_mapping([("a", 1), ("b", 2)], Some("nums"), true)
        .unwrap();

    assert_eq!(
        stats,
        ImportStats {
            inserted: 2,
            updated: 0,
            skipped: 0
        }
    );
    assert_eq!(db.get_int("b", Some("nums")).unwrap(), 2);
}

#[test]
fn test_import_mapping_without_overwrite_skips_existing() {
    let mut db = setup_memory_db();
    db.set("A", 100, None).unwrap();

    let stats = db.import_mapping([("A", 1), ("B", 2)], None, false).unwrap();

    assert_eq!(
        stats,
        ImportStats {
            inserted: 1,
            updated: 0,
            skipped: 1
        }
    );
    assert_eq!(db.get_int("A", None).unwrap(), 100);
    assert_eq!(db.get_int("B", None).unwrap(), 2);
}

#[test]
fn test_import_mapping_with_overwrite_updates_existing() {
    let mut db = setup_memory_db();
    db.set("A", 100, None).unwrap();

    let stats = db.import_mapping([("A", 1), ("B", 2)], None, true).unwrap();

    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.skipped, 0);
    assert_eq!(db.get_int("A", None).unwrap(), 1);
}

#[test]
fn test_import_mapping_mixed_values() {
    let mut db = setup_memory_db();
    let entries: Vec<(String, Value)> = vec![
        ("name".to_string(), Value::from("beam")),
        ("span".to_string(), Value::Float(6.5)),
        ("loads".to_string(), Value::List(vec![Value::Int(1), Value::Int(2)])),
    ];

    let stats = db.import_mapping(entries, None, true).unwrap();

    assert_eq!(stats.total(), 3);
    assert_eq!(db.get_float("span", None).unwrap(), 6.5);
}

#[test]
fn test_import_mapping_partial_failure_keeps_earlier_items() {
    let mut db = setup_memory_db();
    let entries = vec![
        ("ok", Value::Int(1)),
        ("bad", Value::Null),
        ("never", Value::Int(3)),
    ];

    let result = db.import_mapping(entries, None, true);

    assert!(matches!(result, Err(TagKvError::UnsupportedType(_))));
    assert!(db.exists("ok", None).unwrap());
    assert!(!db.exists("bad", None).unwrap());
    assert!(!db.exists("never", None).unwrap());
}

#[test]
fn test_import_mapping_follows_json_object_order() {
    let mut db = setup_memory_db();
    let json: serde_json::Value = serde_json::from_str(r#"{"z": 1, "bad": null, "a": 2}"#).unwrap();
    let serde_json::Value::Object(entries) = json else {
        panic!("expected a JSON object");
    };

    let result = db.import_mapping(
        entries.into_iter().map(|(k, v)| (k, Value::from(v))),
        None,
        true,
    );

    assert!(matches!(result, Err(TagKvError::UnsupportedType(_))));
    assert!(db.exists("z", None).unwrap());
    assert!(!db.exists("a", None).unwrap());
}

#[test]
fn test_import_mapping_on_closed_handle() {
    let mut db = setup_memory_db();
    db.close().unwrap();

    let result = db.import_mapping(Vec::<(&str, i64)>::new(), None, true);

    assert!(matches!(result, Err(TagKvError::NotOpen)));
}

// =============================================================================
// ingest_list Tests
// =============================================================================

#[test]
fn test_ingest_list_counts_missing_key() {
    let mut db = setup_memory_db();
    let items = vec![
        steel(Some("S235"), Value::Float(235.0)),
        steel(None, Value::Int(100)),
    ];

    let stats = db.ingest_list(items, "id", None, true).unwrap();

    assert_eq!(
        stats,
        IngestStats {
            inserted: 1,
            updated: 0,
            skipped_existing: 0,
            missing_key: 1
        }
    );
    assert_eq!(db.len().unwrap(), 1);
}

#[test]
fn test_ingest_list_stores_whole_item() {
    let mut db = setup_memory_db();
    let item = steel(Some("S355"), Value::Float(355.0));

    db.ingest_list(vec![item.clone()], "id", Some("steel"), true)
        .unwrap();

    assert_eq!(db.get("S355", Some("steel")).unwrap(), item);
    assert_eq!(
        db.get_dict("S355", Some("steel")).unwrap()["fy"],
        Value::Float(355.0)
    );
}

#[test]
fn test_ingest_list_overwrite_and_skip() {
    let mut db = setup_memory_db();
    db.ingest_list(vec![steel(Some("S235"), Value::Float(235.0))], "id", None, true)
        .unwrap();

    let skipped = db
        .ingest_list(vec![steel(Some("S235"), Value::Float(1.0))], "id", None, false)
        .unwrap();
    assert_eq!(skipped.skipped_existing, 1);
    assert_eq!(db.get_dict("S235", None).unwrap()["fy"], Value::Float(235.0));

    let updated = db
        .ingest_list(vec![steel(Some("S235"), Value::Float(2.0))], "id", None, true)
        .unwrap();
    assert_eq!(updated.updated, 1);
    assert_eq!(db.get_dict("S235", None).unwrap()["fy"], Value::Float(2.0));
}

fn keyed(id: Value) -> Value {
    let mut map = BTreeMap::new();
    map.insert("id".to_string(), id);
    map.insert("fy".to_string(), Value::Int(1));
    Value::Dict(map)
}

#[test]
fn test_ingest_list_key_extraction() {
    let mut db = setup_memory_db();

    let items = vec![
        keyed(Value::Int(42)),
        keyed(Value::Float(235.0)),
        keyed(Value::Bool(true)),
        keyed(Value::Null),
        keyed(Value::List(vec![Value::Int(1), Value::from("a")])),
    ];

    let stats = db.ingest_list(items, "id", None, true).unwrap();

    assert_eq!(stats.inserted, 5);
    assert_eq!(stats.missing_key, 0);
    let keys: Vec<String> = db.keys(None).unwrap().map(Result::unwrap).collect();
    assert_eq!(keys, vec!["235.0", "42", "None", "True", "[1,\"a\"]"]);
    assert_eq!(db.get_dict("None", None).unwrap()["id"], Value::Null);
}

#[test]
fn test_ingest_list_only_absent_field_is_missing() {
    let mut db = setup_memory_db();

    let items = vec![
        steel(None, Value::Int(1)),
        keyed(Value::Null),
        Value::from("not a dict"),
        Value::Int(7),
    ];

    let stats = db.ingest_list(items, "id", None, true).unwrap();

    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.missing_key, 3);
    assert_eq!(stats.total(), 4);
}

#[test]
fn test_ingest_list_counts_sum_to_items() {
    let mut db = setup_memory_db();
    db.set("S1", 0, None).unwrap();
    db.set("S2", 0, None).unwrap();

    let items = vec![
        steel(Some("S1"), Value::Int(1)),
        steel(Some("S2"), Value::Int(2)),
        steel(Some("S3"), Value::Int(3)),
        steel(None, Value::Int(4)),
        steel(Some("S3"), Value::Int(5)),
    ];
    let count = items.len();

    let stats = db.ingest_list(items, "id", None, false).unwrap();

    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.skipped_existing, 3);
    assert_eq!(stats.missing_key, 1);
    assert_eq!(stats.total(), count);
}

// =============================================================================
// ingest_json_file Tests
// =============================================================================

#[test]
fn test_ingest_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("sections.json");
    fs::write(
        &json_path,
        r#"[
            {"designation": "310UC158", "type": "UC", "dimensions": {"d_mm": 327.0, "r_mm": null}},
            {"designation": "610UB125", "type": "UB", "dimensions": {"d_mm": 612.0, "r_mm": 14}},
            {"type": "PFC"}
        ]"#,
    )
    .unwrap();

    let config = Config::builder().path(temp_dir.path().join("data.db")).build();
    let stats = Database::scoped(config.clone(), |db| {
        db.ingest_json_file(&json_path, "designation", Some("steel"), true)
    })
    .unwrap();

    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.missing_key, 1);

    let db: Database<RedbBackend> = Database::open(config).unwrap();
    let section = db.get_dict("310UC158", Some("steel")).unwrap();
    assert_eq!(section["type"], Value::from("UC"));
    assert_eq!(
        section["dimensions"].field("r_mm"),
        Some(&Value::Null)
    );
    let keys: Vec<String> = db.keys(Some("steel")).unwrap().map(Result::unwrap).collect();
    assert_eq!(keys, vec!["310UC158", "610UB125"]);
}

#[test]
fn test_ingest_json_file_rejects_non_array() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("rows.json");
    fs::write(&json_path, r#"{"designation": "310UC158"}"#).unwrap();
    let mut db = setup_memory_db();

    let result = db.ingest_json_file(&json_path, "designation", None, true);

    assert!(matches!(result, Err(TagKvError::Decode(_))));
}

#[test]
fn test_autosync_flushes_batch() {
    let (backend, control) = RecordingBackend::new();
    let config = Config::builder().autosync(true).build();
    let mut db = Database::with_backend(backend, config);

    db.import_mapping([("a", 1), ("b", 2), ("c", 3)], None, true).unwrap();
    assert_eq!(control.flushes(), 1);

    db.ingest_list(vec![steel(Some("S1"), Value::Int(1))], "id", None, true)
        .unwrap();
    assert_eq!(control.flushes(), 2);
}
