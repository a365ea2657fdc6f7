//! In-process slot store backed by a concurrent hash map.
//!
//! Per-row atomicity comes from `DashMap`: `get_mut`/`entry` hold the shard
//! lock for the duration of the check-and-mutate, so a conditional update is
//! one indivisible step exactly as the trait requires. Suitable for tests and
//! single-process deployments; multi-host deployments need the Postgres
//! backend.

use chrono::NaiveDate;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{BatchWrite, Result, SlotKey, SlotRecord, SlotStore, UpdateOutcome, WriteMode};

#[derive(Debug, Default)]
pub struct MemorySlotStore {
    rows: DashMap<SlotKey, SlotRecord>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held. Test and diagnostics helper.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait::async_trait]
impl SlotStore for MemorySlotStore {
    async fn put_slots(&self, slots: &[SlotRecord], mode: WriteMode) -> Result<BatchWrite> {
        let mut batch = BatchWrite::default();
        for slot in slots {
            match mode {
                WriteMode::Overwrite => {
                    self.rows.insert(slot.key(), slot.clone());
                    batch.written += 1;
                }
                WriteMode::FillGaps => match self.rows.entry(slot.key()) {
                    Entry::Occupied(_) => batch.skipped += 1,
                    Entry::Vacant(vacant) => {
                        vacant.insert(slot.clone());
                        batch.written += 1;
                    }
                },
            }
        }
        Ok(batch)
    }

    async fn get(&self, key: &SlotKey) -> Result<Option<SlotRecord>> {
        Ok(self.rows.get(key).map(|row| row.clone()))
    }

    async fn venue_day(&self, venue_id: Uuid, date: NaiveDate) -> Result<Vec<SlotRecord>> {
        let mut rows: Vec<SlotRecord> = self
            .rows
            .iter()
            .filter(|row| row.venue_id == venue_id && row.date == date)
            .map(|row| row.clone())
            .collect();
        rows.sort_by_key(|row| row.time);
        Ok(rows)
    }

    async fn slots_on_date(&self, date: NaiveDate) -> Result<Vec<SlotRecord>> {
        let mut rows: Vec<SlotRecord> = self
            .rows
            .iter()
            .filter(|row| row.date == date)
            .map(|row| row.clone())
            .collect();
        rows.sort_by(|a, b| (a.venue_id, a.time).cmp(&(b.venue_id, b.time)));
        Ok(rows)
    }

    async fn reserve_one(&self, key: &SlotKey) -> Result<UpdateOutcome> {
        match self.rows.get_mut(key) {
            Some(mut row) if row.available_capacity >= 1 => {
                row.available_capacity -= 1;
                row.booked_count += 1;
                Ok(UpdateOutcome::Applied)
            }
            // Exhausted row and missing row are both "no capacity here"
            _ => Ok(UpdateOutcome::PreconditionFailed),
        }
    }

    async fn release_one(&self, key: &SlotKey) -> Result<UpdateOutcome> {
        match self.rows.get_mut(key) {
            Some(mut row) if row.booked_count >= 1 => {
                row.available_capacity += 1;
                row.booked_count -= 1;
                Ok(UpdateOutcome::Applied)
            }
            _ => Ok(UpdateOutcome::PreconditionFailed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::sync::Arc;

    fn sample_slot(capacity: i32) -> SlotRecord {
        SlotRecord::fresh(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            capacity,
        )
    }

    #[tokio::test]
    async fn reserve_decrements_until_exhausted() {
        let store = MemorySlotStore::new();
        let slot = sample_slot(2);
        let key = slot.key();
        store.put_slots(&[slot], WriteMode::FillGaps).await.unwrap();

        assert!(store.reserve_one(&key).await.unwrap().applied());
        assert!(store.reserve_one(&key).await.unwrap().applied());
        assert_eq!(store.reserve_one(&key).await.unwrap(), UpdateOutcome::PreconditionFailed);

        let row = store.get(&key).await.unwrap().unwrap();
        assert_eq!(row.available_capacity, 0);
        assert_eq!(row.booked_count, 2);
        assert_eq!(row.available_capacity + row.booked_count, row.total_capacity);
    }

    #[tokio::test]
    async fn reserve_on_missing_row_is_precondition_failure() {
        let store = MemorySlotStore::new();
        let key = sample_slot(1).key();
        assert_eq!(store.reserve_one(&key).await.unwrap(), UpdateOutcome::PreconditionFailed);
    }

    #[tokio::test]
    async fn release_guarded_by_booked_count() {
        let store = MemorySlotStore::new();
        let slot = sample_slot(3);
        let key = slot.key();
        store.put_slots(&[slot], WriteMode::FillGaps).await.unwrap();

        // Nothing booked yet: release is a no-op
        assert_eq!(store.release_one(&key).await.unwrap(), UpdateOutcome::PreconditionFailed);

        store.reserve_one(&key).await.unwrap();
        assert!(store.release_one(&key).await.unwrap().applied());
        // And never drives availability above total
        assert_eq!(store.release_one(&key).await.unwrap(), UpdateOutcome::PreconditionFailed);

        let row = store.get(&key).await.unwrap().unwrap();
        assert_eq!(row.available_capacity, 3);
        assert_eq!(row.booked_count, 0);
    }

    #[tokio::test]
    async fn fill_gaps_preserves_live_counters() {
        let store = MemorySlotStore::new();
        let slot = sample_slot(4);
        let key = slot.key();
        store.put_slots(&[slot.clone()], WriteMode::FillGaps).await.unwrap();
        store.reserve_one(&key).await.unwrap();

        let batch = store.put_slots(&[slot.clone()], WriteMode::FillGaps).await.unwrap();
        assert_eq!(batch, BatchWrite { written: 0, skipped: 1 });
        assert_eq!(store.get(&key).await.unwrap().unwrap().booked_count, 1);

        let batch = store.put_slots(&[slot], WriteMode::Overwrite).await.unwrap();
        assert_eq!(batch, BatchWrite { written: 1, skipped: 0 });
        assert_eq!(store.get(&key).await.unwrap().unwrap().booked_count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reserves_never_oversell() {
        let store = Arc::new(MemorySlotStore::new());
        let slot = sample_slot(5);
        let key = slot.key();
        store.put_slots(&[slot], WriteMode::FillGaps).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            let key = key.clone();
            tasks.push(tokio::spawn(async move { store.reserve_one(&key).await.unwrap() }));
        }

        let mut applied = 0;
        for task in tasks {
            if task.await.unwrap().applied() {
                applied += 1;
            }
        }

        assert_eq!(applied, 5);
        let row = store.get(&key).await.unwrap().unwrap();
        assert_eq!(row.available_capacity, 0);
        assert_eq!(row.booked_count, 5);
    }
}
