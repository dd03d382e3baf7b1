//! In-memory store and fixed clock for tests

use super::clock::Clock;
use super::store::{DayStore, PersistenceError};
use crate::db::{DbError, InsertOutcome, Side};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

// ============================================================================
// Fixed Clock
// ============================================================================

/// Clock pinned to a date that tests advance by hand
pub struct FixedClock {
    day: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Mutex::new(day),
        }
    }

    pub fn ymd(y: i32, m: u32, d: u32) -> Self {
        Self::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    pub fn advance_days(&self, n: u64) {
        let mut day = self.day.lock().unwrap();
        *day = day.checked_add_days(Days::new(n)).unwrap();
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.day.lock().unwrap()
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// `DayStore` backed by a map, with hooks to force races and failures
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<NaiveDate, Side>>,
    /// Number of store calls made, of any kind
    calls: AtomicUsize,
    /// Number of `get_day` calls made
    gets: AtomicUsize,
    /// When set, the first `get_day` calls wait here before reading
    get_barrier: Option<(Arc<Barrier>, usize)>,
    fail: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the first `n` reads at a barrier so concurrent callers all see
    /// the same (empty) snapshot before any of them writes
    pub fn with_read_barrier(n: usize) -> Self {
        Self {
            get_barrier: Some((Arc::new(Barrier::new(n)), n)),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<(NaiveDate, Side)> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|(d, s)| (*d, *s))
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), PersistenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::Db(DbError::Poisoned));
        }
        Ok(())
    }
}

#[async_trait]
impl DayStore for MemoryStore {
    async fn get_day(&self, day: NaiveDate) -> Result<Option<Side>, PersistenceError> {
        self.check()?;
        let nth = self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some((barrier, n)) = &self.get_barrier {
            if nth < *n {
                let snapshot = self.rows.lock().unwrap().get(&day).copied();
                barrier.wait().await;
                return Ok(snapshot);
            }
        }
        Ok(self.rows.lock().unwrap().get(&day).copied())
    }

    async fn latest_side_before(&self, day: NaiveDate) -> Result<Option<Side>, PersistenceError> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .range(..day)
            .next_back()
            .map(|(_, s)| *s))
    }

    async fn insert_day(
        &self,
        day: NaiveDate,
        side: Side,
    ) -> Result<InsertOutcome, PersistenceError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&day) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        rows.insert(day, side);
        Ok(InsertOutcome::Inserted(side))
    }
}
