//! SQLite persistence for patient records.
//!
//! The store is a single `patients` table in a local database file. The column layout is
//! fixed (no migrations) and matches files written by earlier releases of the application,
//! so an existing database opens as-is:
//!
//! ```text
//! patients(patient_id INTEGER PRIMARY KEY AUTOINCREMENT, name, age, gender,
//!          condition, admission_date, status)
//! ```
//!
//! `AUTOINCREMENT` guarantees that the id of a deleted record is never handed out again.
//!
//! The row functions take a `&Connection` so they can run either directly on the store or
//! inside a [`rusqlite::Transaction`], which dereferences to a connection.

use crate::constants::{CREATE_PATIENTS_TABLE, LEGACY_DATE_FORMAT, LEGACY_TIMESTAMP_FORMAT};
use crate::patient::{NewAdmission, PatientFilter, PatientId, PatientRecord};
use crate::{PatientError, PatientResult};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use hms_types::{NonEmptyText, PatientStatus};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::{Path, PathBuf};

const SELECT_COLUMNS: &str =
    "SELECT patient_id, name, age, gender, condition, admission_date, status FROM patients";

/// Owned handle on the patient database.
///
/// Opened once at startup and held for the life of the process. Dropping the store closes
/// the connection; [`PatientStore::close`] does the same but reports failures.
#[derive(Debug)]
pub struct PatientStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl PatientStore {
    /// Opens (creating if absent) the database file at `path` and ensures the schema exists.
    ///
    /// The connection uses SQLite's exclusive locking mode, so a second running instance
    /// cannot write to the same file.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::StoreOpen`] if the file cannot be opened and
    /// [`PatientError::SchemaInit`] if the table cannot be created.
    pub fn open(path: impl AsRef<Path>) -> PatientResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| PatientError::StoreOpen {
            path: path.to_path_buf(),
            source,
        })?;
        conn.pragma_update_and_check(None, "locking_mode", "EXCLUSIVE", |row| {
            row.get::<_, String>(0)
        })
        .map_err(PatientError::SchemaInit)?;

        let store = Self::with_connection(conn, Some(path.to_path_buf()))?;
        tracing::info!("opened patient store at {}", path.display());
        Ok(store)
    }

    /// Opens a private in-memory store. Contents are lost when the store is dropped.
    pub fn open_in_memory() -> PatientResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| PatientError::StoreOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> PatientResult<Self> {
        conn.execute_batch(CREATE_PATIENTS_TABLE)
            .map_err(PatientError::SchemaInit)?;
        Ok(Self { conn, path })
    }

    /// Location of the database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn transaction(&mut self) -> PatientResult<Transaction<'_>> {
        self.conn.transaction().map_err(PatientError::Transaction)
    }

    /// Closes the connection, reporting any error SQLite raises while doing so.
    pub fn close(self) -> PatientResult<()> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_conn, err)| PatientError::Close(err))?;
        if let Some(path) = path {
            tracing::info!("closed patient store at {}", path.display());
        }
        Ok(())
    }
}

// ============================================================================
// ROW OPERATIONS
// ============================================================================

/// Inserts a new admission and returns the stored record.
pub(crate) fn insert_patient(
    conn: &Connection,
    admission: &NewAdmission,
    admitted_at: DateTime<Utc>,
) -> PatientResult<PatientRecord> {
    let status = PatientStatus::Admitted;
    conn.execute(
        "INSERT INTO patients (name, age, gender, condition, admission_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            admission.name.as_str(),
            admission.age,
            admission.gender.as_str(),
            admission.condition.as_str(),
            encode_timestamp(admitted_at),
            status.as_str(),
        ],
    )
    .map_err(PatientError::Insert)?;

    Ok(PatientRecord {
        id: PatientId::new(conn.last_insert_rowid()),
        name: admission.name.clone(),
        age: admission.age,
        gender: admission.gender,
        condition: admission.condition.clone(),
        admitted_at,
        status,
    })
}

/// Fetches one record, or `None` if no row has this id.
pub(crate) fn find_patient(conn: &Connection, id: PatientId) -> PatientResult<Option<PatientRecord>> {
    let sql = format!("{SELECT_COLUMNS} WHERE patient_id = ?1");
    let row = conn
        .query_row(&sql, params![id.get()], StoredRow::from_row)
        .optional()
        .map_err(PatientError::Query)?;
    row.map(StoredRow::into_record).transpose()
}

/// Lists records newest first, optionally restricted by `filter`.
pub(crate) fn list_patients(
    conn: &Connection,
    filter: Option<&PatientFilter>,
) -> PatientResult<Vec<PatientRecord>> {
    let sql = format!(
        "{SELECT_COLUMNS}
         WHERE ?1 IS NULL
            OR instr(lower(name), lower(?1)) > 0
            OR instr(CAST(patient_id AS TEXT), ?1) > 0
         ORDER BY patient_id DESC"
    );
    let mut stmt = conn.prepare(&sql).map_err(PatientError::Query)?;
    let rows = stmt
        .query_map(params![filter.map(PatientFilter::as_str)], StoredRow::from_row)
        .map_err(PatientError::Query)?;

    let mut records = Vec::new();
    for row in rows {
        let row = row.map_err(PatientError::Query)?;
        records.push(row.into_record()?);
    }
    Ok(records)
}

/// Overwrites the status of one record. Returns `false` if no row has this id.
pub(crate) fn write_status(
    conn: &Connection,
    id: PatientId,
    status: PatientStatus,
) -> PatientResult<bool> {
    let changed = conn
        .execute(
            "UPDATE patients SET status = ?1 WHERE patient_id = ?2",
            params![status.as_str(), id.get()],
        )
        .map_err(PatientError::Update)?;
    Ok(changed > 0)
}

/// Removes one record. Returns `false` if no row has this id.
pub(crate) fn remove_patient(conn: &Connection, id: PatientId) -> PatientResult<bool> {
    let changed = conn
        .execute("DELETE FROM patients WHERE patient_id = ?1", params![id.get()])
        .map_err(PatientError::Delete)?;
    Ok(changed > 0)
}

// ============================================================================
// ROW DECODING
// ============================================================================

// Raw column values, decoded into a `PatientRecord` only after the row has been read.
struct StoredRow {
    id: i64,
    name: String,
    age: i64,
    gender: String,
    condition: String,
    admission_date: String,
    status: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            gender: row.get(3)?,
            condition: row.get(4)?,
            admission_date: row.get(5)?,
            status: row.get(6)?,
        })
    }

    fn into_record(self) -> PatientResult<PatientRecord> {
        let id = self.id;
        let corrupt = |reason: String| PatientError::CorruptRecord { id, reason };

        Ok(PatientRecord {
            id: PatientId::new(id),
            name: NonEmptyText::new(&self.name).map_err(|_| corrupt("empty name".into()))?,
            age: u32::try_from(self.age)
                .map_err(|_| corrupt(format!("age {} out of range", self.age)))?,
            gender: self.gender.parse().map_err(|e| corrupt(format!("{e}")))?,
            condition: NonEmptyText::new(&self.condition)
                .map_err(|_| corrupt("empty condition".into()))?,
            admitted_at: decode_timestamp(&self.admission_date).ok_or_else(|| {
                corrupt(format!("unreadable admission date '{}'", self.admission_date))
            })?,
            status: self.status.parse().map_err(|e| corrupt(format!("{e}")))?,
        })
    }
}

fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Reads an admission timestamp in any format the store has ever written.
///
/// Legacy values carry no zone and were written in the operator's local time.
fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, LEGACY_DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_types::Gender;
    use tempfile::TempDir;

    fn admission(name: &str) -> NewAdmission {
        NewAdmission::parse(name, "50", "M", "Pneumonia").unwrap()
    }

    fn insert_raw(conn: &Connection, admission_date: &str, status: &str) -> i64 {
        conn.execute(
            "INSERT INTO patients (name, age, gender, condition, admission_date, status)
             VALUES ('Legacy Patient', 61, 'F', 'Asthma', ?1, ?2)",
            params![admission_date, status],
        )
        .expect("raw insert should succeed");
        conn.last_insert_rowid()
    }

    #[test]
    fn test_open_in_memory_creates_empty_table() {
        let store = PatientStore::open_in_memory().expect("in-memory store should open");
        assert!(store.path().is_none());
        let records = list_patients(store.conn(), None).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_insert_then_find_returns_same_record() {
        let store = PatientStore::open_in_memory().unwrap();
        let inserted = insert_patient(store.conn(), &admission("Ada"), Utc::now()).unwrap();

        let found = find_patient(store.conn(), inserted.id)
            .unwrap()
            .expect("record should exist");
        assert_eq!(found, inserted);
    }

    #[test]
    fn test_find_missing_returns_none() {
        let store = PatientStore::open_in_memory().unwrap();
        assert!(find_patient(store.conn(), PatientId::new(99)).unwrap().is_none());
    }

    #[test]
    fn test_write_status_and_remove_report_missing_rows() {
        let store = PatientStore::open_in_memory().unwrap();
        let id = PatientId::new(1);
        assert!(!write_status(store.conn(), id, PatientStatus::Stable).unwrap());
        assert!(!remove_patient(store.conn(), id).unwrap());
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("hms.db");

        let store = PatientStore::open(&db_path).expect("file store should open");
        let inserted = insert_patient(store.conn(), &admission("Grace"), Utc::now()).unwrap();
        store.close().expect("close should succeed");

        let reopened = PatientStore::open(&db_path).expect("reopen should succeed");
        assert_eq!(reopened.path(), Some(db_path.as_path()));
        let records = list_patients(reopened.conn(), None).unwrap();
        assert_eq!(records, vec![inserted]);
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("no-such-dir").join("hms.db");

        let err = PatientStore::open(&db_path).expect_err("open should fail");
        assert_eq!(err.kind(), crate::ErrorKind::Storage);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let store = PatientStore::open_in_memory().unwrap();
        let first = insert_patient(store.conn(), &admission("One"), Utc::now()).unwrap();
        let second = insert_patient(store.conn(), &admission("Two"), Utc::now()).unwrap();
        assert!(remove_patient(store.conn(), second.id).unwrap());

        let third = insert_patient(store.conn(), &admission("Three"), Utc::now()).unwrap();
        assert!(third.id > second.id);
        assert!(second.id > first.id);
    }

    #[test]
    fn test_reads_legacy_timestamp_rows() {
        let store = PatientStore::open_in_memory().unwrap();
        let id = insert_raw(store.conn(), "2024-05-06 14:15:16", "Stable");

        let record = find_patient(store.conn(), PatientId::new(id))
            .unwrap()
            .expect("legacy row should decode");

        let expected_naive =
            NaiveDateTime::parse_from_str("2024-05-06 14:15:16", LEGACY_TIMESTAMP_FORMAT).unwrap();
        let expected = Local
            .from_local_datetime(&expected_naive)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(record.admitted_at, expected);
        assert_eq!(record.gender, Gender::Female);
        assert_eq!(record.status, PatientStatus::Stable);
    }

    #[test]
    fn test_reads_legacy_date_only_rows() {
        let store = PatientStore::open_in_memory().unwrap();
        let id = insert_raw(store.conn(), "2024-05-06", "Admitted");

        let record = find_patient(store.conn(), PatientId::new(id)).unwrap().unwrap();
        let local = record.admitted_at.with_timezone(&Local);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
    }

    #[test]
    fn test_unreadable_row_is_reported_as_corrupt() {
        let store = PatientStore::open_in_memory().unwrap();
        let id = insert_raw(store.conn(), "last tuesday", "Admitted");

        let err = find_patient(store.conn(), PatientId::new(id)).expect_err("row should be corrupt");
        assert!(matches!(err, PatientError::CorruptRecord { id: bad, .. } if bad == id));
    }

    #[test]
    fn test_unknown_status_is_reported_as_corrupt() {
        let store = PatientStore::open_in_memory().unwrap();
        insert_raw(store.conn(), "2024-05-06", "Transferred");

        let err = list_patients(store.conn(), None).expect_err("listing should fail");
        assert!(matches!(err, PatientError::CorruptRecord { .. }));
    }

    #[test]
    fn test_timestamp_encoding_round_trips() {
        let now = Utc::now();
        assert_eq!(decode_timestamp(&encode_timestamp(now)), Some(now));
    }
}
