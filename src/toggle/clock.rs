//! Calendar-day source
//!
//! Every "today" in the service comes from a `Clock`, so the reference
//! timezone is applied in exactly one place.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Source of the current calendar date
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock normalized to a fixed reference timezone
#[derive(Debug, Clone, Copy)]
pub struct ZonedClock {
    tz: Tz,
}

impl ZonedClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Calendar date of `instant` in the reference timezone
    pub fn date_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }
}

impl Clock for ZonedClock {
    fn today(&self) -> NaiveDate {
        self.date_at(Utc::now())
    }
}
