//! Trait abstraction over day-state persistence
//!
//! Lets the toggle policy run against SQLite in production and an in-memory
//! store in tests.

use crate::db::{Database, DbError, InsertOutcome, Side};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Db(#[from] DbError),
    /// Insert lost a race but the winning row could not be read back
    #[error("Row for {0} reported as existing but could not be read")]
    Vanished(NaiveDate),
}

/// Storage for per-day sides
#[async_trait]
pub trait DayStore: Send + Sync {
    /// Side stored for `day`, if any
    async fn get_day(&self, day: NaiveDate) -> Result<Option<Side>, PersistenceError>;

    /// Side of the most recent row strictly before `day`
    async fn latest_side_before(&self, day: NaiveDate) -> Result<Option<Side>, PersistenceError>;

    /// Insert the row for `day`; never overwrites an existing row
    async fn insert_day(&self, day: NaiveDate, side: Side)
        -> Result<InsertOutcome, PersistenceError>;
}

#[async_trait]
impl<T: DayStore + ?Sized> DayStore for Arc<T> {
    async fn get_day(&self, day: NaiveDate) -> Result<Option<Side>, PersistenceError> {
        (**self).get_day(day).await
    }

    async fn latest_side_before(&self, day: NaiveDate) -> Result<Option<Side>, PersistenceError> {
        (**self).latest_side_before(day).await
    }

    async fn insert_day(
        &self,
        day: NaiveDate,
        side: Side,
    ) -> Result<InsertOutcome, PersistenceError> {
        (**self).insert_day(day, side).await
    }
}

/// Adapter to use Database as a `DayStore`
#[derive(Clone)]
pub struct DatabaseStore {
    db: Database,
}

impl DatabaseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DayStore for DatabaseStore {
    async fn get_day(&self, day: NaiveDate) -> Result<Option<Side>, PersistenceError> {
        Ok(self.db.get_day(day)?.map(|row| row.side))
    }

    async fn latest_side_before(&self, day: NaiveDate) -> Result<Option<Side>, PersistenceError> {
        Ok(self.db.latest_before(day)?.map(|row| row.side))
    }

    async fn insert_day(
        &self,
        day: NaiveDate,
        side: Side,
    ) -> Result<InsertOutcome, PersistenceError> {
        Ok(self.db.insert_day(day, side)?)
    }
}
