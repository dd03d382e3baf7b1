//! Database module for Whereabouts
//!
//! Persists one `DayState` row per calendar day. Rows are only ever inserted.

mod schema;

pub use schema::*;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Get the row for a day, if one was created
    pub fn get_day(&self, day: NaiveDate) -> DbResult<Option<DayState>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT day, side, created_at FROM day_states WHERE day = ?1")?;

        stmt.query_row(params![format_day(day)], row_to_day_state)
            .optional()
            .map_err(DbError::from)
    }

    /// Most recent row strictly before `day`
    pub fn latest_before(&self, day: NaiveDate) -> DbResult<Option<DayState>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT day, side, created_at FROM day_states
             WHERE day < ?1
             ORDER BY day DESC
             LIMIT 1",
        )?;

        stmt.query_row(params![format_day(day)], row_to_day_state)
            .optional()
            .map_err(DbError::from)
    }

    /// Most recent row overall
    pub fn latest(&self) -> DbResult<Option<DayState>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT day, side, created_at FROM day_states ORDER BY day DESC LIMIT 1",
        )?;

        stmt.query_row([], row_to_day_state)
            .optional()
            .map_err(DbError::from)
    }

    /// Insert the row for a day.
    ///
    /// A unique-constraint violation on `day` means another writer created the
    /// row first; that is reported as `InsertOutcome::AlreadyExists`.
    pub fn insert_day(&self, day: NaiveDate, side: Side) -> DbResult<InsertOutcome> {
        let conn = self.lock()?;
        let now = Utc::now();

        let result = conn.execute(
            "INSERT INTO day_states (day, side, created_at) VALUES (?1, ?2, ?3)",
            params![format_day(day), side.as_str(), now.to_rfc3339()],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(side)),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::AlreadyExists),
            Err(e) => Err(DbError::Sqlite(e)),
        }
    }

    /// All rows, oldest first
    #[allow(dead_code)] // Used in tests
    pub fn list_days(&self) -> DbResult<Vec<DayState>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT day, side, created_at FROM day_states ORDER BY day ASC")?;

        let rows = stmt.query_map([], row_to_day_state)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn row_to_day_state(row: &Row<'_>) -> rusqlite::Result<DayState> {
    let day: String = row.get(0)?;
    let side: String = row.get(1)?;
    let created_at: String = row.get(2)?;

    let day = NaiveDate::parse_from_str(&day, DAY_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let side = side.parse::<Side>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at = parse_datetime(&created_at).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(DayState {
        day,
        side,
        created_at,
    })
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}
