//! Read-only availability projections.
//!
//! Two views over the slot table, no mutation and no concurrency concerns:
//! consumer discovery (one date across venues, open capacity only) and
//! venue-side management (one venue across a date range, every row).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::store::{SlotRecord, SlotStore};

/// One open slot in the by-date discovery view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAvailability {
    #[serde(with = "wall_clock")]
    pub time: NaiveTime,
    pub available: i32,
    pub total: i32,
}

/// Discovery view: venues with open capacity on one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateAvailability {
    pub date: NaiveDate,
    /// venue -> open slots, chronological
    pub venues: BTreeMap<Uuid, Vec<SlotAvailability>>,
}

impl DateAvailability {
    pub fn total_venues(&self) -> usize {
        self.venues.len()
    }
}

pub struct AvailabilityQuery {
    store: Arc<dyn SlotStore>,
}

impl AvailabilityQuery {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self { store }
    }

    /// Every slot on `date` with open capacity, grouped by venue.
    #[instrument(skip(self), fields(%date))]
    pub async fn by_date(&self, date: NaiveDate) -> Result<DateAvailability> {
        let rows = self.store.slots_on_date(date).await?;

        let mut venues: BTreeMap<Uuid, Vec<SlotAvailability>> = BTreeMap::new();
        for row in rows {
            if row.available_capacity > 0 {
                venues.entry(row.venue_id).or_default().push(SlotAvailability {
                    time: row.time,
                    available: row.available_capacity,
                    total: row.total_capacity,
                });
            }
        }

        Ok(DateAvailability { date, venues })
    }

    /// Every slot row for one venue over an inclusive date range, keyed by
    /// date. Management view: exhausted slots are included, and a closed or
    /// ungenerated date appears as an empty list.
    #[instrument(skip(self), fields(%venue_id, %start_date, %end_date))]
    pub async fn venue_range(
        &self,
        venue_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Vec<SlotRecord>>> {
        if start_date > end_date {
            return Err(Error::InvalidInterval {
                message: format!("start_date ({start_date}) must be before or equal to end_date ({end_date})"),
            });
        }

        let mut by_date = BTreeMap::new();
        for date in start_date.iter_days().take_while(|d| *d <= end_date) {
            let rows = self.store.venue_day(venue_id, date).await?;
            by_date.insert(date, rows);
        }
        Ok(by_date)
    }
}

/// Serde for consumer-facing "HH:MM" wall-clock strings
mod wall_clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySlotStore;
    use crate::store::{SlotKey, WriteMode};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn time(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    async fn seed(store: &MemorySlotStore, venue: Uuid, hour: u32, capacity: i32) -> SlotKey {
        let record = SlotRecord::fresh(venue, date(), time(hour), capacity);
        let key = record.key();
        store.put_slots(&[record], WriteMode::FillGaps).await.unwrap();
        key
    }

    #[tokio::test]
    async fn by_date_groups_by_venue_and_hides_exhausted_slots() {
        let store = Arc::new(MemorySlotStore::new());
        let (venue_a, venue_b) = (Uuid::new_v4(), Uuid::new_v4());

        let exhausted = seed(&store, venue_a, 9, 1).await;
        seed(&store, venue_a, 10, 2).await;
        seed(&store, venue_b, 9, 3).await;
        store.reserve_one(&exhausted).await.unwrap();

        let query = AvailabilityQuery::new(store.clone());
        let availability = query.by_date(date()).await.unwrap();

        assert_eq!(availability.total_venues(), 2);
        assert_eq!(
            availability.venues[&venue_a],
            vec![SlotAvailability {
                time: time(10),
                available: 2,
                total: 2
            }]
        );
        assert_eq!(availability.venues[&venue_b].len(), 1);
    }

    #[tokio::test]
    async fn by_date_with_nothing_open_is_empty() {
        let store = Arc::new(MemorySlotStore::new());
        let query = AvailabilityQuery::new(store);
        let availability = query.by_date(date()).await.unwrap();
        assert_eq!(availability.total_venues(), 0);
    }

    #[tokio::test]
    async fn venue_range_includes_exhausted_rows_and_empty_dates() {
        let store = Arc::new(MemorySlotStore::new());
        let venue = Uuid::new_v4();
        let key = seed(&store, venue, 9, 1).await;
        store.reserve_one(&key).await.unwrap();

        let query = AvailabilityQuery::new(store.clone());
        let end = date().succ_opt().unwrap();
        let by_date = query.venue_range(venue, date(), end).await.unwrap();

        assert_eq!(by_date.len(), 2);
        let first = &by_date[&date()];
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].available_capacity, 0);
        assert!(by_date[&end].is_empty());
    }

    #[tokio::test]
    async fn venue_range_rejects_inverted_range() {
        let query = AvailabilityQuery::new(Arc::new(MemorySlotStore::new()));
        let err = query
            .venue_range(Uuid::new_v4(), date(), date().pred_opt().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInterval { .. }));
    }

    #[test]
    fn slot_availability_serializes_wall_clock_times() {
        let entry = SlotAvailability {
            time: time(9),
            available: 1,
            total: 2,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["time"], "09:00");
        let back: SlotAvailability = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
