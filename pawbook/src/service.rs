//! Capacity service facade.
//!
//! The call surface the booking-management collaborator uses during booking
//! creation and cancellation, and that discovery/management UIs use for
//! queries. Composes the generator, reservation engine, and availability
//! queries over one shared store, resolving venues through the directory
//! seam.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::availability::{AvailabilityQuery, DateAvailability};
use crate::errors::{Error, Result};
use crate::generator::{GenerationSummary, SlotGenerator};
use crate::reservation::{ReleaseSummary, Reservation, ReservationEngine};
use crate::store::{SlotRecord, SlotStore, WriteMode};
use crate::venue::{Venue, VenueDirectory};

pub struct CapacityService {
    venues: Arc<dyn VenueDirectory>,
    engine: ReservationEngine,
    generator: SlotGenerator,
    query: AvailabilityQuery,
}

impl CapacityService {
    pub fn new(store: Arc<dyn SlotStore>, venues: Arc<dyn VenueDirectory>) -> Self {
        Self {
            venues,
            engine: ReservationEngine::new(Arc::clone(&store)),
            generator: SlotGenerator::new(Arc::clone(&store)),
            query: AvailabilityQuery::new(store),
        }
    }

    async fn venue(&self, venue_id: Uuid) -> Result<Venue> {
        self.venues
            .get(venue_id)
            .await?
            .ok_or(Error::VenueNotFound { id: venue_id })
    }

    /// Claim capacity for a booking interval before the booking record is
    /// persisted. A failure must abort the booking creation upstream.
    #[instrument(skip(self), fields(%venue_id))]
    pub async fn reserve_capacity(&self, venue_id: Uuid, start: NaiveDateTime, end: NaiveDateTime) -> Result<Reservation> {
        let venue = self.venue(venue_id).await?;
        self.engine.reserve(venue_id, start, end, venue.slot_duration).await
    }

    /// Return the capacity held by a cancelled booking. Best-effort:
    /// per-slot failures are logged inside the engine and never block the
    /// cancellation.
    #[instrument(skip(self), fields(%venue_id))]
    pub async fn release_capacity(&self, venue_id: Uuid, start: NaiveDateTime, end: NaiveDateTime) -> Result<ReleaseSummary> {
        let venue = self.venue(venue_id).await?;
        self.engine.release(venue_id, start, end, venue.slot_duration).await
    }

    /// Populate the slot table for a venue over an inclusive date range
    /// (venue onboarding, or explicit future windows).
    #[instrument(skip(self), fields(%venue_id))]
    pub async fn generate_slots(
        &self,
        venue_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        mode: WriteMode,
    ) -> Result<GenerationSummary> {
        let venue = self.venue(venue_id).await?;
        self.generator.generate_range(&venue, start_date, end_date, mode).await
    }

    /// Discovery view: venues with open capacity on one date
    pub async fn query_availability(&self, date: NaiveDate) -> Result<DateAvailability> {
        self.query.by_date(date).await
    }

    /// Management view: every slot row for one venue over a date range
    pub async fn query_venue_slots(
        &self,
        venue_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Vec<SlotRecord>>> {
        self.query.venue_range(venue_id, start_date, end_date).await
    }
}
