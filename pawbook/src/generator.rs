//! Batch slot generation.
//!
//! Populates the slot store for a venue over a date range, one batch of put
//! operations per date. Dates are isolated from each other: a failure on one
//! date (malformed operating hours, store error) is recorded and the
//! remaining dates still run.
//!
//! The default write mode is [`WriteMode::FillGaps`], which only creates rows
//! that do not exist yet. Re-running generation over a date that already has
//! bookings therefore never resets live counters; resetting requires an
//! explicit [`WriteMode::Overwrite`].

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::errors::{Error, Result};
use crate::schedule;
use crate::store::{SlotStore, WriteMode};
use crate::venue::Venue;

/// Outcome of one generation run.
#[derive(Debug, Default)]
pub struct GenerationSummary {
    /// Rows created (or, under `Overwrite`, replaced)
    pub slots_written: u64,
    /// Rows left untouched because they already existed
    pub slots_skipped: u64,
    /// Dates whose generation failed, with the failure
    pub failed_dates: Vec<(NaiveDate, Error)>,
}

impl GenerationSummary {
    pub fn fully_succeeded(&self) -> bool {
        self.failed_dates.is_empty()
    }
}

pub struct SlotGenerator {
    store: Arc<dyn SlotStore>,
}

impl SlotGenerator {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self { store }
    }

    /// Generate slots for every date in the inclusive range.
    #[instrument(skip(self, venue), fields(venue_id = %venue.id, %start_date, %end_date, ?mode))]
    pub async fn generate_range(
        &self,
        venue: &Venue,
        start_date: NaiveDate,
        end_date: NaiveDate,
        mode: WriteMode,
    ) -> Result<GenerationSummary> {
        if start_date > end_date {
            return Err(Error::InvalidInterval {
                message: format!("start_date ({start_date}) must be before or equal to end_date ({end_date})"),
            });
        }

        let mut summary = GenerationSummary::default();
        for date in start_date.iter_days().take_while(|d| *d <= end_date) {
            match self.generate_date(venue, date, mode).await {
                Ok((written, skipped)) => {
                    summary.slots_written += written;
                    summary.slots_skipped += skipped;
                }
                Err(err) => {
                    warn!(venue_id = %venue.id, %date, error = %err, "slot generation failed for date");
                    summary.failed_dates.push((date, err));
                }
            }
        }

        info!(
            venue_id = %venue.id,
            written = summary.slots_written,
            skipped = summary.slots_skipped,
            failed_dates = summary.failed_dates.len(),
            "generated slots"
        );
        Ok(summary)
    }

    async fn generate_date(&self, venue: &Venue, date: NaiveDate, mode: WriteMode) -> Result<(u64, u64)> {
        let slots = schedule::slots_for_date(venue, date)?;
        if slots.is_empty() {
            // Closed day: zero slots, not an error
            return Ok((0, 0));
        }
        let batch = self.store.put_slots(&slots, mode).await?;
        Ok((batch.written, batch.skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySlotStore;
    use crate::store::SlotKey;
    use crate::venue::DayHours;
    use chrono::NaiveTime;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn weekday_venue() -> Venue {
        let mut hours = HashMap::new();
        for day in ["monday", "tuesday", "wednesday", "thursday", "friday"] {
            hours.insert(day.to_string(), DayHours::open("09:00", "12:00"));
        }
        hours.insert("saturday".to_string(), DayHours::closed());
        // sunday intentionally absent
        Venue {
            id: Uuid::new_v4(),
            capacity: 4,
            operating_hours: hours,
            slot_duration: 60,
        }
    }

    // 2024-06-10 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[tokio::test]
    async fn generates_a_week_skipping_closed_days() {
        let store = Arc::new(MemorySlotStore::new());
        let generator = SlotGenerator::new(store.clone());
        let venue = weekday_venue();

        let sunday = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        let summary = generator
            .generate_range(&venue, monday(), sunday, WriteMode::FillGaps)
            .await
            .unwrap();

        // 5 open days x 3 slots; saturday closed, sunday unknown
        assert_eq!(summary.slots_written, 15);
        assert_eq!(summary.slots_skipped, 0);
        assert!(summary.fully_succeeded());
        assert_eq!(store.len(), 15);

        let saturday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(store.venue_day(venue.id, saturday).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn regeneration_fills_gaps_without_resetting_counters() {
        let store = Arc::new(MemorySlotStore::new());
        let generator = SlotGenerator::new(store.clone());
        let venue = weekday_venue();

        generator
            .generate_range(&venue, monday(), monday(), WriteMode::FillGaps)
            .await
            .unwrap();

        let key = SlotKey::new(venue.id, monday(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        store.reserve_one(&key).await.unwrap();

        let summary = generator
            .generate_range(&venue, monday(), monday(), WriteMode::FillGaps)
            .await
            .unwrap();
        assert_eq!(summary.slots_written, 0);
        assert_eq!(summary.slots_skipped, 3);
        assert_eq!(store.get(&key).await.unwrap().unwrap().booked_count, 1);

        // Explicit overwrite is the only way to reset
        generator
            .generate_range(&venue, monday(), monday(), WriteMode::Overwrite)
            .await
            .unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap().booked_count, 0);
    }

    #[tokio::test]
    async fn bad_weekday_fails_only_its_dates() {
        let store = Arc::new(MemorySlotStore::new());
        let generator = SlotGenerator::new(store.clone());
        let mut venue = weekday_venue();
        venue
            .operating_hours
            .insert("tuesday".to_string(), DayHours::open("oops", "12:00"));

        let friday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let summary = generator
            .generate_range(&venue, monday(), friday, WriteMode::FillGaps)
            .await
            .unwrap();

        assert_eq!(summary.slots_written, 12);
        assert_eq!(summary.failed_dates.len(), 1);
        let (failed_date, err) = &summary.failed_dates[0];
        assert_eq!(*failed_date, NaiveDate::from_ymd_opt(2024, 6, 11).unwrap());
        assert!(matches!(err, Error::InvalidSchedule { .. }));
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let generator = SlotGenerator::new(Arc::new(MemorySlotStore::new()));
        let venue = weekday_venue();
        let err = generator
            .generate_range(&venue, monday(), monday().pred_opt().unwrap(), WriteMode::FillGaps)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInterval { .. }));
    }
}
