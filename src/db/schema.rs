//! Database schema and types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS day_states (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    day TEXT NOT NULL UNIQUE,
    side TEXT NOT NULL CHECK (side IN ('left', 'right')),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_day_states_day ON day_states(day DESC);
";

/// Format used for the `day` column. Lexicographic order matches date order.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Which side is active for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The other side
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown side {0:?}, expected \"left\" or \"right\"")]
pub struct ParseSideError(pub String);

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(ParseSideError(s.to_string())),
        }
    }
}

/// One persisted row: the side chosen for a calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayState {
    pub day: NaiveDate,
    pub side: Side,
    pub created_at: DateTime<Utc>,
}

/// Outcome of an insert attempt for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Our row was written
    Inserted(Side),
    /// A row for the day already existed; ours was discarded
    AlreadyExists,
}
