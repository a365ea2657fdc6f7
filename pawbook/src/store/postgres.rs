//! PostgreSQL slot store.
//!
//! Conditional counter updates are single-row `UPDATE ... WHERE <guard>`
//! statements; `rows_affected` distinguishes an applied update from a
//! precondition failure (the guard also fails when the row does not exist,
//! which is the same answer the engine needs). Queries are built at runtime
//! so the crate compiles without a live database.

use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;
use uuid::Uuid;

use super::{BatchWrite, Result, SlotKey, SlotRecord, SlotStore, UpdateOutcome, WriteMode};

const SLOT_COLUMNS: &str = "venue_id, date, slot_time, available_capacity, total_capacity, booked_count, created_at";

#[derive(Debug, Clone)]
pub struct PostgresSlotStore {
    pool: PgPool,
}

impl PostgresSlotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run pending migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(8).connect(url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| super::StoreError::Other(anyhow::Error::from(e)))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl SlotStore for PostgresSlotStore {
    #[instrument(skip(self, slots), fields(count = slots.len(), ?mode), err)]
    async fn put_slots(&self, slots: &[SlotRecord], mode: WriteMode) -> Result<BatchWrite> {
        let statement = match mode {
            WriteMode::FillGaps => {
                "INSERT INTO slots (venue_id, date, slot_time, available_capacity, total_capacity, booked_count, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (venue_id, date, slot_time) DO NOTHING"
            }
            WriteMode::Overwrite => {
                "INSERT INTO slots (venue_id, date, slot_time, available_capacity, total_capacity, booked_count, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (venue_id, date, slot_time) DO UPDATE
                 SET available_capacity = EXCLUDED.available_capacity,
                     total_capacity = EXCLUDED.total_capacity,
                     booked_count = EXCLUDED.booked_count,
                     created_at = EXCLUDED.created_at"
            }
        };

        let mut batch = BatchWrite::default();
        for slot in slots {
            let result = sqlx::query(statement)
                .bind(slot.venue_id)
                .bind(slot.date)
                .bind(slot.time)
                .bind(slot.available_capacity)
                .bind(slot.total_capacity)
                .bind(slot.booked_count)
                .bind(slot.created_at)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 1 {
                batch.written += 1;
            } else {
                batch.skipped += 1;
            }
        }
        Ok(batch)
    }

    async fn get(&self, key: &SlotKey) -> Result<Option<SlotRecord>> {
        let row = sqlx::query_as::<_, SlotRecord>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE venue_id = $1 AND date = $2 AND slot_time = $3"
        ))
        .bind(key.venue_id)
        .bind(key.date)
        .bind(key.time)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn venue_day(&self, venue_id: Uuid, date: NaiveDate) -> Result<Vec<SlotRecord>> {
        let rows = sqlx::query_as::<_, SlotRecord>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE venue_id = $1 AND date = $2 ORDER BY slot_time"
        ))
        .bind(venue_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn slots_on_date(&self, date: NaiveDate) -> Result<Vec<SlotRecord>> {
        let rows = sqlx::query_as::<_, SlotRecord>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE date = $1 ORDER BY venue_id, slot_time"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self), fields(slot = %key), err)]
    async fn reserve_one(&self, key: &SlotKey) -> Result<UpdateOutcome> {
        let result = sqlx::query(
            "UPDATE slots
             SET available_capacity = available_capacity - 1,
                 booked_count = booked_count + 1
             WHERE venue_id = $1 AND date = $2 AND slot_time = $3
               AND available_capacity >= 1",
        )
        .bind(key.venue_id)
        .bind(key.date)
        .bind(key.time)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(UpdateOutcome::Applied)
        } else {
            Ok(UpdateOutcome::PreconditionFailed)
        }
    }

    #[instrument(skip(self), fields(slot = %key), err)]
    async fn release_one(&self, key: &SlotKey) -> Result<UpdateOutcome> {
        let result = sqlx::query(
            "UPDATE slots
             SET available_capacity = available_capacity + 1,
                 booked_count = booked_count - 1
             WHERE venue_id = $1 AND date = $2 AND slot_time = $3
               AND booked_count >= 1",
        )
        .bind(key.venue_id)
        .bind(key.date)
        .bind(key.time)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(UpdateOutcome::Applied)
        } else {
            Ok(UpdateOutcome::PreconditionFailed)
        }
    }
}
