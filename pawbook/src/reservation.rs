//! Capacity reservation and release.
//!
//! Reserving a booking interval claims one unit from every slot the interval
//! spans, or claims none. There is no cross-row transaction: each slot is a
//! separate conditional decrement, and a failure part-way is compensated by
//! incrementing every slot this call already claimed. Concurrent readers can
//! observe a transiently half-reserved interval; the compensation is what
//! restores the pre-call state after any failure. Two racing reservations are
//! serialized per slot by the store, and the loser only ever rolls back its
//! own decrements, so it cannot corrupt the winner's state.
//!
//! Release is deliberately asymmetric: a reservation failure blocks a new
//! booking (acceptable to reject), but a cancellation must always complete,
//! so per-slot release failures are logged and skipped rather than raised.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::schedule;
use crate::store::{SlotKey, SlotStore, UpdateOutcome};

/// A successfully claimed booking interval: every listed slot was decremented.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub venue_id: Uuid,
    pub date: NaiveDate,
    /// Chronological slot keys this reservation holds
    pub slots: Vec<SlotKey>,
}

/// Outcome of a best-effort release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseSummary {
    pub released: u64,
    /// Slots whose guard failed (already released, or never reserved) or
    /// whose update errored; logged, never raised
    pub skipped: u64,
}

pub struct ReservationEngine {
    store: Arc<dyn SlotStore>,
}

impl ReservationEngine {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self { store }
    }

    /// Atomically claim one unit from every slot spanned by
    /// `[start, end)`, or claim none.
    ///
    /// Slots are processed in chronological order, so the first slot lacking
    /// capacity is the one reported in [`Error::NoCapacity`].
    #[instrument(skip(self), fields(%venue_id, %start, %end))]
    pub async fn reserve(
        &self,
        venue_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
        slot_duration: u32,
    ) -> Result<Reservation> {
        let times = schedule::booking_slot_times(start, end, slot_duration)?;
        let date = start.date();

        let mut reserved: Vec<SlotKey> = Vec::with_capacity(times.len());
        for time in times {
            let key = SlotKey::new(venue_id, date, time);
            match self.store.reserve_one(&key).await {
                Ok(UpdateOutcome::Applied) => reserved.push(key),
                Ok(UpdateOutcome::PreconditionFailed) => {
                    debug!(slot = %key, already_reserved = reserved.len(), "slot out of capacity, rolling back");
                    self.rollback(&reserved).await;
                    return Err(Error::NoCapacity { date, time });
                }
                Err(err) => {
                    self.rollback(&reserved).await;
                    return Err(err.into());
                }
            }
        }

        debug!(slots = reserved.len(), "reserved capacity");
        Ok(Reservation {
            venue_id,
            date,
            slots: reserved,
        })
    }

    /// Compensate a partial reservation by returning every unit this call
    /// claimed. The slots are disjoint rows, so order does not matter.
    ///
    /// A failed compensation leaks capacity (the slot will show less
    /// availability than truly exists); that is a known degraded-but-safe
    /// mode, logged with enough detail for manual reconciliation and never
    /// re-raised so the caller still sees the original failure.
    async fn rollback(&self, reserved: &[SlotKey]) {
        for key in reserved {
            match self.store.release_one(key).await {
                Ok(UpdateOutcome::Applied) => {}
                Ok(UpdateOutcome::PreconditionFailed) => {
                    error!(slot = %key, "rollback found slot not booked; counters need manual reconciliation");
                }
                Err(err) => {
                    error!(slot = %key, error = %err, "rollback failed; slot capacity leaked until reconciled");
                }
            }
        }
    }

    /// Return the units held by a cancelled booking, best-effort.
    ///
    /// Uses the same interval decomposition as [`reserve`](Self::reserve), so
    /// it targets exactly the slots the original reservation decremented.
    /// Only a malformed interval fails the call, before any store I/O; the
    /// per-slot guard (`booked_count >= 1`) makes a duplicate release a
    /// logged no-op instead of an invariant violation.
    #[instrument(skip(self), fields(%venue_id, %start, %end))]
    pub async fn release(
        &self,
        venue_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
        slot_duration: u32,
    ) -> Result<ReleaseSummary> {
        let times = schedule::booking_slot_times(start, end, slot_duration)?;
        let date = start.date();

        let mut summary = ReleaseSummary::default();
        for time in times {
            let key = SlotKey::new(venue_id, date, time);
            match self.store.release_one(&key).await {
                Ok(UpdateOutcome::Applied) => summary.released += 1,
                Ok(UpdateOutcome::PreconditionFailed) => {
                    warn!(slot = %key, "release skipped: slot not booked");
                    summary.skipped += 1;
                }
                Err(err) => {
                    error!(slot = %key, error = %err, "release failed for slot, continuing");
                    summary.skipped += 1;
                }
            }
        }

        debug!(released = summary.released, skipped = summary.skipped, "released capacity");
        Ok(summary)
    }
}
