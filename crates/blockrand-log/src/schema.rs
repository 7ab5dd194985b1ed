use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use blockrand_core::{AssignmentRecord, ErrorInfo, LogStore, RandError};
use rusqlite::{params, Connection, OptionalExtension};

pub const SCHEMA_VERSION: i64 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), RandError> {
    conn.execute_batch(
        "BEGIN;
        CREATE TABLE IF NOT EXISTS meta(version INTEGER NOT NULL);
        CREATE TABLE IF NOT EXISTS assignments(
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_id TEXT NOT NULL,
            age_level TEXT NOT NULL,
            duration_level TEXT NOT NULL,
            bev_free_level TEXT NOT NULL,
            stratum_key TEXT NOT NULL,
            assigned_group TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );
        CREATE TRIGGER IF NOT EXISTS assignments_no_update
            BEFORE UPDATE ON assignments
            BEGIN SELECT RAISE(ABORT, 'assignment log is append-only'); END;
        CREATE TRIGGER IF NOT EXISTS assignments_no_delete
            BEFORE DELETE ON assignments
            BEGIN SELECT RAISE(ABORT, 'assignment log is append-only'); END;
        COMMIT;",
    )
    .map_err(|err| RandError::persistence("blockrand_log.schema", err))?;
    set_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

fn set_version(conn: &Connection, version: i64) -> Result<(), RandError> {
    let existing: Option<i64> = conn
        .query_row("SELECT version FROM meta LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|err| RandError::persistence("blockrand_log.schema", err))?;
    match existing {
        Some(current) if current == version => Ok(()),
        Some(current) => Err(RandError::Persistence(ErrorInfo::new(
            "blockrand_log.schema_version",
            format!("log schema {current} incompatible with expected {version}"),
        ))),
        None => {
            conn.execute("INSERT INTO meta(version) VALUES (?)", params![version])
                .map_err(|err| RandError::persistence("blockrand_log.schema", err))?;
            Ok(())
        }
    }
}

pub fn insert_record(conn: &Connection, record: &AssignmentRecord) -> Result<i64, RandError> {
    let [subject_id, age, duration, bev_free, stratum_key, group, timestamp] = record.to_fields();
    conn.execute(
        "INSERT INTO assignments(subject_id, age_level, duration_level, bev_free_level, stratum_key, assigned_group, timestamp) VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![subject_id, age, duration, bev_free, stratum_key, group, timestamp],
    )
    .map_err(|err| {
        RandError::Persistence(
            ErrorInfo::new("blockrand_log.append", err.to_string())
                .with_context("subject_id", record.subject_id.clone()),
        )
    })?;
    Ok(conn.last_insert_rowid())
}

pub fn load_records(conn: &Connection) -> Result<Vec<AssignmentRecord>, RandError> {
    let mut stmt = conn
        .prepare(
            "SELECT subject_id, age_level, duration_level, bev_free_level, stratum_key, assigned_group, timestamp FROM assignments ORDER BY seq",
        )
        .map_err(|err| RandError::persistence("blockrand_log.read", err))?;
    let rows = stmt
        .query_map([], |row| {
            (0..7)
                .map(|idx| row.get::<_, String>(idx))
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(|err| RandError::persistence("blockrand_log.read", err))?;
    let mut records = Vec::new();
    for row in rows {
        let fields = row.map_err(|err| RandError::persistence("blockrand_log.read", err))?;
        let record = AssignmentRecord::from_fields(&fields).map_err(|err| {
            RandError::Persistence(
                ErrorInfo::new("blockrand_log.corrupt_row", err.info().message.clone())
                    .with_context("row", fields.join(",")),
            )
        })?;
        records.push(record);
    }
    Ok(records)
}

/// SQLite-backed [`LogStore`].
#[derive(Debug)]
pub struct SqliteLogStore {
    conn: Mutex<Connection>,
}

impl SqliteLogStore {
    /// Opens (creating if needed) the log database at `path`.
    pub fn open(path: &Path) -> Result<Self, RandError> {
        let conn = Connection::open(path).map_err(|err| {
            RandError::Persistence(
                ErrorInfo::new("blockrand_log.open", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, RandError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| RandError::persistence("blockrand_log.open", err))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, RandError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RandError> {
        self.conn.lock().map_err(|_| {
            RandError::Persistence(ErrorInfo::new(
                "blockrand_log.poisoned",
                "log connection lock poisoned",
            ))
        })
    }
}

impl LogStore for SqliteLogStore {
    fn append_record(&self, record: &AssignmentRecord) -> Result<(), RandError> {
        let conn = self.conn()?;
        let seq = insert_record(&conn, record)?;
        tracing::debug!(seq, subject_id = %record.subject_id, "assignment appended");
        Ok(())
    }

    fn read_all_records(&self) -> Result<Vec<AssignmentRecord>, RandError> {
        let conn = self.conn()?;
        load_records(&conn)
    }
}
