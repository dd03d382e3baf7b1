//! Daily left/right toggle
//!
//! The side for a day is fixed the first time anyone asks for it: it is the
//! opposite of the most recent earlier day's side, or the configured initial
//! side when nothing has been stored yet. Once written it never changes.

pub mod clock;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use clock::{Clock, ZonedClock};
pub use store::{DatabaseStore, DayStore, PersistenceError};

use crate::db::{InsertOutcome, Side};
use chrono::NaiveDate;
use std::sync::Arc;

/// Side to flip from when `day` has no row yet.
///
/// With an empty history this is the opposite of `initial`, so the first
/// stored side is `initial` itself.
pub fn prior_side(latest: Option<Side>, initial: Side) -> Side {
    latest.unwrap_or_else(|| initial.opposite())
}

/// Get-or-create orchestration over a `DayStore`
#[derive(Clone)]
pub struct Toggle {
    store: Arc<dyn DayStore>,
    clock: Arc<dyn Clock>,
    initial: Side,
}

impl Toggle {
    pub fn new(store: Arc<dyn DayStore>, clock: Arc<dyn Clock>, initial: Side) -> Self {
        Self {
            store,
            clock,
            initial,
        }
    }

    /// Current date in the reference timezone
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Side stored for today; `None` until the first query of the day
    #[allow(dead_code)] // API completeness
    pub async fn get_today(&self) -> Result<Option<Side>, PersistenceError> {
        self.store.get_day(self.today()).await
    }

    /// Store `previous.opposite()` as today's side and return today's side
    #[allow(dead_code)] // API completeness
    pub async fn create_today(&self, previous: Side) -> Result<Side, PersistenceError> {
        self.create_for(self.today(), previous).await
    }

    /// Today's side, creating the row on the first query of the day
    pub async fn resolve_today(&self) -> Result<Side, PersistenceError> {
        self.resolve_for(self.today()).await
    }

    async fn resolve_for(&self, day: NaiveDate) -> Result<Side, PersistenceError> {
        if let Some(side) = self.store.get_day(day).await? {
            return Ok(side);
        }

        let latest = self.store.latest_side_before(day).await?;
        let previous = prior_side(latest, self.initial);
        self.create_for(day, previous).await
    }

    async fn create_for(&self, day: NaiveDate, previous: Side) -> Result<Side, PersistenceError> {
        let next = previous.opposite();

        match self.store.insert_day(day, next).await? {
            InsertOutcome::Inserted(side) => {
                tracing::info!(day = %day, side = %side, "Created day state");
                Ok(side)
            }
            InsertOutcome::AlreadyExists => {
                // Another request created the row first; its value wins
                let winner = self
                    .store
                    .get_day(day)
                    .await?
                    .ok_or(PersistenceError::Vanished(day))?;
                tracing::debug!(day = %day, side = %winner, "Day state already created");
                Ok(winner)
            }
        }
    }
}
