//! Storage layer for attendance stamps.
//!
//! Provides a durable [`Ledger`] using `rusqlite`.
//!
//! # Uniqueness
//!
//! The `attendance` table's primary key is `(day_key, employee_id,
//! event_type)`. [`Ledger::record`] is a single conditional insert, so the
//! duplicate check and the write cannot be split by another writer, even one
//! in a different process sharing the same file.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. Open one `Database` per thread (they may point at the same
//! file) or wrap it in a `Mutex`.
//!
//! # Schema
//!
//! - `day_key`: `YYYY-MM-DD` in the fixed civil timezone. Lexicographic
//!   ordering matches chronological ordering.
//! - `event_type`: `entrance` or `exit`.
//! - `stamp`: the human-readable label shown to the employee.
//! - `recorded_at`: UTC instant of the write, ISO 8601. Always the system
//!   time at which the row was inserted, whatever clock produced `stamp`, so
//!   imported and test-clock stamps stay distinguishable from live ones.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use ponto_core::{DayKey, DayRecord, EmployeeId, EventType, Ledger, LedgerError, UnknownEventType};
use rusqlite::{Connection, params};
use thiserror::Error;

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row no longer parses into domain types.
    #[error("invalid {column} in attendance row: {value}")]
    InvalidRow { column: &'static str, value: String },
    /// An imported blob names an event type we do not know.
    #[error("ledger blob entry for {employee_id} on {day}: {source}")]
    BlobEventType {
        day: DayKey,
        employee_id: EmployeeId,
        source: UnknownEventType,
    },
    /// An imported blob holds two labels for the same event, e.g. `Entrada`
    /// and `entrance`.
    #[error("ledger blob has two {event_type} stamps for {employee_id} on {day}")]
    ConflictingBlobStamps {
        day: DayKey,
        employee_id: EmployeeId,
        event_type: EventType,
    },
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        Self::storage(err)
    }
}

/// Whole ledger in the nested `day → employee → event type → stamp` layout.
pub type LedgerBlob = BTreeMap<DayKey, BTreeMap<EmployeeId, BTreeMap<EventType, String>>>;

/// A blob as read from disk, before event type labels are resolved.
///
/// Legacy blobs use `Entrada`/`Saída`; keeping the labels raw lets an import
/// notice when two of them name the same event.
pub type RawLedgerBlob = BTreeMap<DayKey, BTreeMap<EmployeeId, BTreeMap<String, String>>>;

struct AttendanceRecord {
    day: DayKey,
    employee_id: EmployeeId,
    event_type: EventType,
    stamp: String,
}

/// Resolves event type labels, refusing a blob where two labels collide.
fn resolve_blob(raw: RawLedgerBlob) -> Result<LedgerBlob, DbError> {
    let mut blob = LedgerBlob::new();
    for (day, employees) in raw {
        for (employee_id, events) in employees {
            let mut resolved = BTreeMap::new();
            for (label, stamp) in events {
                let event_type: EventType =
                    label.parse().map_err(|source| DbError::BlobEventType {
                        day,
                        employee_id: employee_id.clone(),
                        source,
                    })?;
                if resolved.insert(event_type, stamp).is_some() {
                    return Err(DbError::ConflictingBlobStamps {
                        day,
                        employee_id,
                        event_type,
                    });
                }
            }
            blob.entry(day).or_default().insert(employee_id, resolved);
        }
    }
    Ok(blob)
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS attendance (
                day_key TEXT NOT NULL,
                employee_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                stamp TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                PRIMARY KEY (day_key, employee_id, event_type)
            );

            CREATE INDEX IF NOT EXISTS idx_attendance_employee
                ON attendance(employee_id, day_key);
            ",
        )?;
        Ok(())
    }

    /// Inserts one stamp unless the triple exists. Returns rows written.
    fn insert_if_absent(
        conn: &Connection,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
        stamp: &str,
    ) -> Result<usize, DbError> {
        let written = conn.execute(
            "
            INSERT INTO attendance (day_key, employee_id, event_type, stamp, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (day_key, employee_id, event_type) DO NOTHING
            ",
            params![
                day.to_string(),
                employee_id.as_str(),
                event_type.as_str(),
                stamp,
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            ],
        )?;
        Ok(written)
    }

    /// Lists every stamp ordered by day, employee and event type.
    fn list_records(&self) -> Result<Vec<AttendanceRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT day_key, employee_id, event_type, stamp
            FROM attendance
            ORDER BY day_key ASC, employee_id ASC, event_type ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (day, employee_id, event_type, stamp) = row?;
            records.push(AttendanceRecord {
                day: parse_day(&day)?,
                employee_id: EmployeeId::new(employee_id.clone()).map_err(|_| {
                    DbError::InvalidRow {
                        column: "employee_id",
                        value: employee_id,
                    }
                })?,
                event_type: parse_event_type(&event_type)?,
                stamp,
            });
        }
        Ok(records)
    }

    /// Renders the whole ledger in the nested blob layout.
    pub fn export_blob(&self) -> Result<LedgerBlob, DbError> {
        let mut blob = LedgerBlob::new();
        for record in self.list_records()? {
            blob.entry(record.day)
                .or_default()
                .entry(record.employee_id)
                .or_default()
                .insert(record.event_type, record.stamp);
        }
        Ok(blob)
    }

    /// Ingests a nested blob, keeping any stamp already stored for a triple.
    ///
    /// The whole blob is resolved before anything is written; a blob with an
    /// unknown or doubled event type imports nothing. Returns the number of
    /// stamps written.
    pub fn import_blob(&mut self, raw: RawLedgerBlob) -> Result<usize, DbError> {
        let blob = resolve_blob(raw)?;
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for (day, employees) in &blob {
            for (employee_id, events) in employees {
                for (event_type, stamp) in events {
                    inserted += Self::insert_if_absent(&tx, employee_id, day, *event_type, stamp)?;
                }
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, "imported ledger blob");
        Ok(inserted)
    }
}

fn parse_day(value: &str) -> Result<DayKey, DbError> {
    value.parse().map_err(|_| DbError::InvalidRow {
        column: "day_key",
        value: value.to_string(),
    })
}

fn parse_event_type(value: &str) -> Result<EventType, DbError> {
    value.parse().map_err(|_| DbError::InvalidRow {
        column: "event_type",
        value: value.to_string(),
    })
}

impl Ledger for Database {
    fn has(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
    ) -> Result<bool, LedgerError> {
        let exists: bool = self
            .conn
            .query_row(
                "
                SELECT EXISTS (
                    SELECT 1 FROM attendance
                    WHERE day_key = ? AND employee_id = ? AND event_type = ?
                )
                ",
                params![day.to_string(), employee_id.as_str(), event_type.as_str()],
                |row| row.get(0),
            )
            .map_err(DbError::from)?;
        Ok(exists)
    }

    fn record(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
        stamp: &str,
    ) -> Result<(), LedgerError> {
        let written = Self::insert_if_absent(&self.conn, employee_id, day, event_type, stamp)?;
        if written == 0 {
            return Err(LedgerError::AlreadyRecorded {
                employee_id: employee_id.clone(),
                day: *day,
                event_type,
            });
        }
        Ok(())
    }

    fn history_for(&self, employee_id: &EmployeeId) -> Result<Vec<DayRecord>, LedgerError> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT day_key, event_type, stamp
                FROM attendance
                WHERE employee_id = ?
                ORDER BY day_key DESC
                ",
            )
            .map_err(DbError::from)?;
        let rows = stmt
            .query_map([employee_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(DbError::from)?;
        let mut parsed = Vec::new();
        for row in rows {
            let (day, event_type, stamp) = row.map_err(DbError::from)?;
            parsed.push((parse_day(&day)?, parse_event_type(&event_type)?, stamp));
        }
        Ok(ponto_core::ledger::fold_history(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn emp(id: &str) -> EmployeeId {
        EmployeeId::new(id).unwrap()
    }

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "attendance"),
            vec!["day_key", "employee_id", "event_type", "stamp", "recorded_at"]
        );
        assert!(index_names(&db.conn, "attendance").contains("idx_attendance_employee"));
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn record_is_idempotent_and_keeps_first_stamp() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let (id, d) = (emp("01"), day("2026-10-19"));

        db.record(&id, &d, EventType::Entrance, "first").unwrap();
        let err = db.record(&id, &d, EventType::Entrance, "second").unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyRecorded { .. }));

        assert!(db.has(&id, &d, EventType::Entrance).unwrap());
        assert!(!db.has(&id, &d, EventType::Exit).unwrap());

        let stored: String = db
            .conn
            .query_row(
                "SELECT stamp FROM attendance WHERE employee_id = ?",
                ["01"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, "first");
    }

    #[test]
    fn two_connections_on_one_file_store_one_stamp() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("ponto.db");
        let tab_a = Database::open(&path).unwrap();
        let tab_b = Database::open(&path).unwrap();
        let (id, d) = (emp("01"), day("2026-10-19"));

        // Both pass the check before either writes.
        assert!(!tab_a.has(&id, &d, EventType::Exit).unwrap());
        assert!(!tab_b.has(&id, &d, EventType::Exit).unwrap());

        tab_a.record(&id, &d, EventType::Exit, "from a").unwrap();
        let err = tab_b.record(&id, &d, EventType::Exit, "from b").unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyRecorded { .. }));

        let history = tab_b.history_for(&id).unwrap();
        assert_eq!(history[0].exit.as_deref(), Some("from a"));
    }

    #[test]
    fn history_is_most_recent_first() {
        let db = Database::open_in_memory().unwrap();
        let me = emp("01");
        db.record(&me, &day("2026-09-30"), EventType::Entrance, "e30").unwrap();
        db.record(&me, &day("2026-10-02"), EventType::Exit, "x02").unwrap();
        db.record(&me, &day("2026-10-01"), EventType::Entrance, "e01").unwrap();
        db.record(&me, &day("2026-10-01"), EventType::Exit, "x01").unwrap();
        db.record(&emp("02"), &day("2026-10-03"), EventType::Entrance, "x").unwrap();

        let history = db.history_for(&me).unwrap();
        assert_eq!(
            history,
            vec![
                DayRecord {
                    day: day("2026-10-02"),
                    entrance: None,
                    exit: Some("x02".to_string()),
                },
                DayRecord {
                    day: day("2026-10-01"),
                    entrance: Some("e01".to_string()),
                    exit: Some("x01".to_string()),
                },
                DayRecord {
                    day: day("2026-09-30"),
                    entrance: Some("e30".to_string()),
                    exit: None,
                },
            ]
        );
    }

    #[test]
    fn unknown_employee_has_empty_history() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.history_for(&emp("nobody")).unwrap().is_empty());
    }

    #[test]
    fn corrupt_rows_surface_as_storage_errors() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO attendance VALUES ('2026-10-19', '01', 'lunch', 's', '2026-10-19T12:00:00Z')",
                [],
            )
            .unwrap();
        let err = db.history_for(&emp("01")).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert_eq!(
            err.to_string(),
            "ledger storage error: invalid event_type in attendance row: lunch"
        );
    }

    #[test]
    fn import_skips_existing_triples() {
        let mut db = Database::open_in_memory().unwrap();
        db.record(&emp("01"), &day("2026-10-19"), EventType::Entrance, "kept")
            .unwrap();

        let blob: RawLedgerBlob = serde_json::from_str(
            r#"{
                "2026-10-19": {"01": {"Entrada": "replaced?", "Saída": "19/10/2026 17:05:00 (BRT)"}},
                "2026-10-18": {"02": {"entrance": "18/10/2026 09:01:00 (BRT)"}}
            }"#,
        )
        .unwrap();
        let inserted = db.import_blob(blob.clone()).unwrap();
        assert_eq!(inserted, 2);

        let history = db.history_for(&emp("01")).unwrap();
        assert_eq!(history[0].entrance.as_deref(), Some("kept"));
        assert_eq!(
            history[0].exit.as_deref(),
            Some("19/10/2026 17:05:00 (BRT)")
        );
        assert_eq!(db.import_blob(blob).unwrap(), 0);
    }

    #[test]
    fn import_refuses_two_labels_for_one_event() {
        let mut db = Database::open_in_memory().unwrap();
        let blob: RawLedgerBlob = serde_json::from_str(
            r#"{
                "2026-10-18": {"02": {"entrance": "18/10/2026 09:01:00 (BRT)"}},
                "2026-10-19": {"01": {"Entrada": "19/10/2026 08:02:00 (BRT)", "entrance": "19/10/2026 08:20:00 (BRT)"}}
            }"#,
        )
        .unwrap();

        let err = db.import_blob(blob).unwrap_err();
        assert!(matches!(
            err,
            DbError::ConflictingBlobStamps {
                event_type: EventType::Entrance,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "ledger blob has two entrance stamps for 01 on 2026-10-19"
        );
        assert!(db.export_blob().unwrap().is_empty());
    }

    #[test]
    fn import_reports_unknown_labels() {
        let mut db = Database::open_in_memory().unwrap();
        let blob: RawLedgerBlob =
            serde_json::from_str(r#"{"2026-10-17": {"01": {"Almoço": "x"}}}"#).unwrap();
        let err = db.import_blob(blob).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ledger blob entry for 01 on 2026-10-17: unknown event type: Almoço"
        );
    }

    #[test]
    fn recorded_at_is_the_time_of_the_write() {
        let db = Database::open_in_memory().unwrap();
        let before = Utc::now() - chrono::Duration::seconds(1);
        db.record(
            &emp("01"),
            &day("2019-01-02"),
            EventType::Entrance,
            "02/01/2019 08:15:00 (BRT)",
        )
        .unwrap();
        let after = Utc::now() + chrono::Duration::seconds(1);

        let recorded_at: String = db
            .conn
            .query_row("SELECT recorded_at FROM attendance", [], |row| row.get(0))
            .unwrap();
        let recorded_at = chrono::DateTime::parse_from_rfc3339(&recorded_at)
            .unwrap()
            .with_timezone(&Utc);
        assert!(before <= recorded_at && recorded_at <= after);
    }

    #[test]
    fn export_uses_nested_layout() {
        let db = Database::open_in_memory().unwrap();
        db.record(&emp("01"), &day("2026-10-19"), EventType::Entrance, "e")
            .unwrap();
        db.record(&emp("01"), &day("2026-10-19"), EventType::Exit, "x")
            .unwrap();
        db.record(&emp("02"), &day("2026-10-20"), EventType::Entrance, "e2")
            .unwrap();

        let json = serde_json::to_string(&db.export_blob().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"2026-10-19":{"01":{"entrance":"e","exit":"x"}},"2026-10-20":{"02":{"entrance":"e2"}}}"#
        );
    }
}
