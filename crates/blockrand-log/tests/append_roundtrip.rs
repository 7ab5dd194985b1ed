use blockrand_core::{
    AgeLevel, AssignmentRecord, BevFreeLevel, DurationLevel, Group, LogStore, Stratum,
};
use blockrand_log::{MemoryLogStore, SqliteLogStore};
use rusqlite::Connection;
use tempfile::NamedTempFile;

fn record(subject_id: &str, stratum: Stratum, group: Group) -> AssignmentRecord {
    AssignmentRecord {
        subject_id: subject_id.into(),
        age_level: stratum.age,
        duration_level: stratum.duration,
        bev_free_level: stratum.bev_free,
        stratum_key: stratum.key(),
        assigned_group: group,
        timestamp: "2024-05-01 09:30:00".into(),
    }
}

fn samples() -> Vec<AssignmentRecord> {
    let young = Stratum::new(
        AgeLevel::Under75,
        DurationLevel::Under18Months,
        BevFreeLevel::Under2Months,
    );
    let old = Stratum::new(
        AgeLevel::Over75,
        DurationLevel::Over18Months,
        BevFreeLevel::Over2Months,
    );
    vec![
        record("S-003", young, Group::C),
        record("S-001", old, Group::A),
        record("S-002", young, Group::B),
    ]
}

#[test]
fn sqlite_records_read_back_in_append_order() {
    let db = NamedTempFile::new().expect("db");
    let store = SqliteLogStore::open(db.path()).expect("open");
    for record in samples() {
        store.append_record(&record).expect("append");
    }
    assert_eq!(store.read_all_records().expect("read"), samples());
}

#[test]
fn sqlite_log_survives_reopen() {
    let db = NamedTempFile::new().expect("db");
    {
        let store = SqliteLogStore::open(db.path()).expect("open");
        store.append_record(&samples()[0]).expect("append");
    }
    let reopened = SqliteLogStore::open(db.path()).expect("reopen");
    let records = reopened.read_all_records().expect("read");
    assert_eq!(records, vec![samples()[0].clone()]);
}

#[test]
fn sqlite_log_rejects_updates_and_deletes() {
    let db = NamedTempFile::new().expect("db");
    let store = SqliteLogStore::open(db.path()).expect("open");
    store.append_record(&samples()[0]).expect("append");
    drop(store);
    let conn = Connection::open(db.path()).expect("raw open");
    assert!(conn
        .execute("UPDATE assignments SET assigned_group = 'Group A'", [])
        .is_err());
    assert!(conn.execute("DELETE FROM assignments", []).is_err());
}

#[test]
fn empty_log_reads_as_empty_not_error() {
    let store = SqliteLogStore::open_in_memory().expect("open");
    assert!(store.read_all_records().expect("read").is_empty());
}

#[test]
fn memory_store_injects_failures() {
    let store = MemoryLogStore::new();
    store.fail_next_appends(1);
    let first = store.append_record(&samples()[0]);
    assert_eq!(first.expect_err("injected").code(), "blockrand_log.append");
    store.append_record(&samples()[0]).expect("second append");
    assert_eq!(store.append_calls(), 2);
    assert_eq!(store.len(), 1);

    store.fail_reads(true);
    assert!(store.read_all_records().is_err());
}
