//! # Vayu Store
//!
//! Append-only SQLite log of every accepted reading.
//!
//! ## Contract
//! - `write` durably appends one row with the reading's ingest timestamp.
//! - `recent` returns the newest rows for join reconciliation.
//! - `query` serves the named range/limit surface, newest-first.
//!
//! A write failure maps to [`StoreError::Unavailable`] and must never take
//! down the caller's live path; the ingest pipeline logs it and continues.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use thiserror::Error;
use vayu_models::time::{format_rfc3339, parse_rfc3339_utc};
use vayu_models::{HistoryRange, Reading, RowLimit, StoredReading};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS readings (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  temperature REAL NOT NULL,
  humidity REAL NOT NULL,
  recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_readings_recorded_at
  ON readings(recorded_at DESC);

CREATE TRIGGER IF NOT EXISTS trg_readings_no_update
BEFORE UPDATE ON readings
BEGIN
  SELECT RAISE(FAIL, 'readings is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_readings_no_delete
BEFORE DELETE ON readings
BEGIN
  SELECT RAISE(FAIL, 'readings is append-only');
END;
";

/// Errors surfaced by the telemetry store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database could not be reached or refused the operation.
    #[error("telemetry store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Durable history log over a single SQLite database.
///
/// The connection sits behind a mutex so the ingest task and concurrent
/// viewer handlers can share one store; every call holds the lock for a
/// single statement.
pub struct TelemetryStore {
    conn: Mutex<Connection>,
}

impl TelemetryStore {
    /// Open (or create) the store at `path`, applying the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|err| StoreError::Unavailable(err.to_string()))?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory store, used by tests and throwaway tooling.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Durably append one reading. The row timestamp is the reading's
    /// ingest timestamp; the row id is assigned by the database.
    pub fn write(&self, reading: &Reading) -> Result<StoredReading, StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO readings(temperature, humidity, recorded_at) VALUES (?1, ?2, ?3)",
            params![
                reading.temperature,
                reading.humidity,
                format_rfc3339(reading.received_at)
            ],
        )?;

        Ok(StoredReading {
            id: conn.last_insert_rowid(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            recorded_at: reading.received_at,
        })
    }

    /// The newest `limit` rows, newest-first. Used for the historical
    /// backfill when a viewer attaches.
    pub fn recent(&self, limit: u32) -> Result<Vec<StoredReading>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, temperature, humidity, recorded_at
             FROM readings
             ORDER BY recorded_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![i64::from(limit)], parse_reading_row)?;
        collect_rows(rows)
    }

    /// Rows inside the named range, newest-first, capped by `limit`.
    pub fn query(
        &self,
        range: HistoryRange,
        limit: RowLimit,
    ) -> Result<Vec<StoredReading>, StoreError> {
        self.query_at(range, limit, chrono::Utc::now())
    }

    /// Range query with an explicit reference instant for the window
    /// cutoff.
    pub fn query_at(
        &self,
        range: HistoryRange,
        limit: RowLimit,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<StoredReading>, StoreError> {
        let mut sql = "SELECT id, temperature, humidity, recorded_at
             FROM readings
             WHERE recorded_at >= ?1
             ORDER BY recorded_at DESC, id DESC"
            .to_string();
        if let RowLimit::Rows(cap) = limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&cap.to_string());
        }

        let cutoff = format_rfc3339(range.cutoff(now));
        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![cutoff], parse_reading_row)?;
        collect_rows(rows)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock means a panicking holder, not a broken database.
        self.conn.lock().unwrap_or_else(|err| err.into_inner())
    }

    #[cfg(test)]
    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.lock()
    }
}

fn parse_reading_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredReading> {
    let recorded_raw: String = row.get(3)?;
    let recorded_at = parse_rfc3339_utc(&recorded_raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(err),
        )
    })?;

    Ok(StoredReading {
        id: row.get(0)?,
        temperature: row.get(1)?,
        humidity: row.get(2)?,
        recorded_at,
    })
}

fn collect_rows(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<StoredReading>>,
) -> Result<Vec<StoredReading>, StoreError> {
    let mut values = Vec::new();
    for row in rows {
        values.push(row?);
    }
    Ok(values)
}
