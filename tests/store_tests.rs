//! Integration tests for the durable record store
//!
//! These exercise full open -> write -> close cycles against real files,
//! covering incremental re-crawl semantics: bootstrap, supersession,
//! carry-over, idempotence, and crash-atomicity of the rewrite.

use gleaner::store::{CsvStore, FieldType, Record, RecordStore, Schema, Status, Value};
use tempfile::tempdir;

fn schema() -> Schema {
    Schema::new(
        vec![
            ("id".to_string(), FieldType::Int),
            ("title".to_string(), FieldType::Str),
            ("price".to_string(), FieldType::Float),
            ("flag".to_string(), FieldType::Int),
        ],
        "id",
    )
    .unwrap()
}

fn record(id: i64, title: &str, price: Option<f64>, status: Status) -> Record {
    let mut r = Record::new();
    r.set("id", Value::Int(id))
        .set("title", Value::Str(title.to_string()))
        .set(
            "price",
            price.map(Value::Float).unwrap_or(Value::Absent),
        )
        .set_status("flag", status);
    r
}

#[test]
fn fresh_file_bootstrap() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto.csv");

    let mut store = CsvStore::open(&path, schema()).unwrap();
    for id in 1..=3 {
        store
            .write(record(id, &format!("item {id}"), Some(10.0), Status::New))
            .unwrap();
    }
    store.close().unwrap();

    // Reopen: previously written keys are visible, others are not
    let reopened = CsvStore::open(&path, schema()).unwrap();
    for id in 1..=3 {
        assert!(reopened.exists(&record(id, "", None, Status::New)).unwrap());
    }
    assert!(!reopened.exists(&record(4, "", None, Status::New)).unwrap());
}

#[test]
fn idempotent_across_cycles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto.csv");

    for _ in 0..2 {
        let mut store = CsvStore::open(&path, schema()).unwrap();
        store
            .write(record(1, "same item", Some(5.0), Status::New))
            .unwrap();
        store.close().unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    // Header plus exactly one record for the key
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn supersession_marks_updated_and_carries_over_the_rest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto.csv");

    // First crawl: two new records
    let mut store = CsvStore::open(&path, schema()).unwrap();
    store.write(record(1, "one", Some(100.0), Status::New)).unwrap();
    store.write(record(2, "two", Some(200.0), Status::New)).unwrap();
    store.close().unwrap();

    // Second crawl: id 1 shows up again with a new price
    let mut store = CsvStore::open(&path, schema()).unwrap();
    let incoming = record(1, "one", Some(90.0), Status::New);
    assert!(store.exists(&incoming).unwrap());
    store.write(record(1, "one", Some(90.0), Status::Updated)).unwrap();
    store.close().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3); // header + 2 records, no duplicates

    let id1_rows: Vec<&&str> = lines.iter().filter(|l| l.starts_with("1,")).collect();
    assert_eq!(id1_rows.len(), 1);
    assert!(id1_rows[0].contains("90"));
    assert!(id1_rows[0].ends_with(",1")); // flag = updated

    // id 2 carried over unchanged
    let id2_rows: Vec<&&str> = lines.iter().filter(|l| l.starts_with("2,")).collect();
    assert_eq!(id2_rows.len(), 1);
    assert!(id2_rows[0].contains("200"));
    assert!(id2_rows[0].ends_with(",0")); // still new
}

#[test]
fn exists_alone_does_not_supersede() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto.csv");

    let mut store = CsvStore::open(&path, schema()).unwrap();
    store.write(record(1, "kept", Some(1.0), Status::New)).unwrap();
    store.close().unwrap();

    // Query the key but never write it
    let mut store = CsvStore::open(&path, schema()).unwrap();
    assert!(store.exists(&record(1, "", None, Status::New)).unwrap());
    store.close().unwrap();

    let reopened = CsvStore::open(&path, schema()).unwrap();
    assert!(reopened.exists(&record(1, "", None, Status::New)).unwrap());
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("kept"));
}

#[test]
fn terminated_flag_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto.csv");

    let mut store = CsvStore::open(&path, schema()).unwrap();
    store.write(record(7, "gone", None, Status::Terminated)).unwrap();
    store.close().unwrap();

    let reopened = CsvStore::open(&path, schema()).unwrap();
    let loaded = reopened.original_records().next().unwrap();
    assert_eq!(
        Status::from_value(loaded.get("flag").unwrap()),
        Some(Status::Terminated)
    );
}

#[test]
fn absent_values_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto.csv");

    let mut store = CsvStore::open(&path, schema()).unwrap();
    store.write(record(1, "no price", None, Status::New)).unwrap();
    store.close().unwrap();

    let reopened = CsvStore::open(&path, schema()).unwrap();
    let loaded = reopened.original_records().next().unwrap();
    // Empty cell decodes to the absent sentinel, not 0.0
    assert_eq!(loaded.get("price"), Some(&Value::Absent));
}

#[test]
fn interrupted_session_leaves_original_intact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto.csv");

    let mut store = CsvStore::open(&path, schema()).unwrap();
    store.write(record(1, "original", Some(1.0), Status::New)).unwrap();
    store.close().unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    // A session that writes but is dropped before close simulates an
    // interruption before the atomic rename: nothing may change on disk.
    {
        let mut store = CsvStore::open(&path, schema()).unwrap();
        store
            .write(record(1, "halfway", Some(2.0), Status::Updated))
            .unwrap();
        store.write(record(2, "extra", Some(3.0), Status::New)).unwrap();
        // dropped without close
    }

    let after = std::fs::read_to_string(&path).unwrap();
    assert_eq!(before, after);
}

#[test]
fn quoting_is_non_numeric() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto.csv");

    let mut store = CsvStore::open(&path, schema()).unwrap();
    store.write(record(1, "Sedan, blue", Some(12500.5), Status::New)).unwrap();
    store.close().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    // Header names are quoted, numeric values are not
    assert_eq!(lines.next().unwrap(), r#""id","title","price","flag""#);
    assert_eq!(lines.next().unwrap(), r#"1,"Sedan, blue",12500.5,0"#);
}

#[test]
fn schema_with_unknown_identity_is_rejected() {
    let result = Schema::new(vec![("id".to_string(), FieldType::Int)], "uuid");
    assert!(result.is_err());
}
