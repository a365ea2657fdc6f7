//! Slot store layer: persistence and atomic counter updates.
//!
//! The slot table is a key-value layout keyed by (venue + date, slot start
//! time), holding the capacity counters for one bookable time unit. All
//! mutation goes through conditional single-row updates; the store backend is
//! what serializes concurrent updates against the same row, so the engine
//! above never needs application-level locks.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ CapacityService    │  (service facade)
//! └─────────┬──────────┘
//!           │
//!           ↓
//! ┌────────────────────┐
//! │ SlotStore (trait)  │  (conditional per-row updates)
//! └─────────┬──────────┘
//!           │
//!     ┌─────┴──────┐
//!     ↓            ↓
//! ┌────────┐  ┌──────────┐
//! │ memory │  │ postgres │
//! └────────┘  └──────────┘
//! ```
//!
//! Precondition failure on a conditional update is an expected branch, not an
//! error: it is how the engine observes "no capacity left" (or "not booked"
//! on release) and is reported as [`UpdateOutcome::PreconditionFailed`].
//! [`StoreError`] is reserved for backend-level failures.

pub mod memory;
pub mod postgres;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Composite identity of one slot row: (venue + date) partition, start time sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub venue_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SlotKey {
    pub fn new(venue_id: Uuid, date: NaiveDate, time: NaiveTime) -> Self {
        Self { venue_id, date, time }
    }

    /// Partition key in the original wire layout, `"{venue_id}#{date}"`
    pub fn partition(&self) -> String {
        format!("{}#{}", self.venue_id, self.date)
    }

    /// Sort key: zero-padded wall-clock start time
    pub fn sort(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.partition(), self.sort())
    }
}

/// One persisted slot row.
///
/// Invariant for every row that exists:
/// `available_capacity + booked_count == total_capacity`, with
/// `0 <= available_capacity <= total_capacity`. Only the conditional
/// reserve/release updates may move the mutable counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SlotRecord {
    pub venue_id: Uuid,
    pub date: NaiveDate,
    #[sqlx(rename = "slot_time")]
    pub time: NaiveTime,
    pub available_capacity: i32,
    pub total_capacity: i32,
    pub booked_count: i32,
    pub created_at: DateTime<Utc>,
}

impl SlotRecord {
    /// A freshly generated slot: full availability, nothing booked.
    pub fn fresh(venue_id: Uuid, date: NaiveDate, time: NaiveTime, capacity: i32) -> Self {
        Self {
            venue_id,
            date,
            time,
            available_capacity: capacity,
            total_capacity: capacity,
            booked_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.venue_id, self.date, self.time)
    }
}

/// Result of a conditional single-row update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The precondition held and the mutation was applied
    Applied,
    /// The precondition did not hold (or the row does not exist); nothing changed
    PreconditionFailed,
}

impl UpdateOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied)
    }
}

/// Write semantics for batch slot generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Create only rows that do not exist yet; never reset live counters
    #[default]
    FillGaps,
    /// Destructively replace existing rows, resetting their counters
    Overwrite,
}

/// Outcome of a batch put: rows written vs. rows left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchWrite {
    pub written: u64,
    pub skipped: u64,
}

/// Unified error type for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Catch-all for non-recoverable backend errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Other(anyhow::Error::from(err))
    }
}

/// Type alias for store operation results
pub type Result<T> = std::result::Result<T, StoreError>;

/// The slot table, behind whichever backend is configured.
///
/// Implementations must guarantee that [`reserve_one`](SlotStore::reserve_one)
/// and [`release_one`](SlotStore::release_one) evaluate their precondition and
/// apply their mutation as one indivisible step per row; concurrent
/// conditional updates against the same row are linearized by the backend.
#[async_trait::async_trait]
pub trait SlotStore: Send + Sync {
    /// Batch-write generated slot rows for one date, per [`WriteMode`]
    async fn put_slots(&self, slots: &[SlotRecord], mode: WriteMode) -> Result<BatchWrite>;

    /// Fetch a single slot row, if present
    async fn get(&self, key: &SlotKey) -> Result<Option<SlotRecord>>;

    /// All rows for one venue on one date, ordered by start time
    async fn venue_day(&self, venue_id: Uuid, date: NaiveDate) -> Result<Vec<SlotRecord>>;

    /// All rows for one date across every venue (secondary lookup by date)
    async fn slots_on_date(&self, date: NaiveDate) -> Result<Vec<SlotRecord>>;

    /// Conditional decrement: `available_capacity -= 1, booked_count += 1`,
    /// guarded by `available_capacity >= 1`
    async fn reserve_one(&self, key: &SlotKey) -> Result<UpdateOutcome>;

    /// Conditional increment: `available_capacity += 1, booked_count -= 1`,
    /// guarded by `booked_count >= 1`
    async fn release_one(&self, key: &SlotKey) -> Result<UpdateOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_key_wire_format() {
        let venue = Uuid::nil();
        let key = SlotKey::new(
            venue,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );
        assert_eq!(key.partition(), format!("{venue}#2024-03-04"));
        assert_eq!(key.sort(), "09:00");
    }

    #[test]
    fn fresh_record_satisfies_invariant() {
        let record = SlotRecord::fresh(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            5,
        );
        assert_eq!(record.available_capacity, 5);
        assert_eq!(record.total_capacity, 5);
        assert_eq!(record.booked_count, 0);
        assert_eq!(record.available_capacity + record.booked_count, record.total_capacity);
    }
}
