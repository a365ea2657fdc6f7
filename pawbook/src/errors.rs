use crate::store::StoreError;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(ThisError, Debug)]
pub enum Error {
    /// A slot within the requested interval had no remaining capacity.
    ///
    /// Carries the exact offending slot so callers can report
    /// "no availability at HH:MM" rather than a generic failure.
    #[error("No capacity available at {time} on {date}")]
    NoCapacity { date: NaiveDate, time: NaiveTime },

    /// Invalid booking interval, rejected before any store interaction
    #[error("{message}")]
    InvalidInterval { message: String },

    /// Malformed wall-clock time in a venue's operating hours
    #[error("Invalid operating hours for {day}: {value:?}")]
    InvalidSchedule { day: String, value: String },

    /// Venue unknown to the directory
    #[error("Venue {id} not found")]
    VenueNotFound { id: Uuid },

    /// Slot store operation error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether this error is an expected, user-facing rejection rather than
    /// an internal failure. Drives log severity at the call boundary.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NoCapacity { .. }
                | Error::InvalidInterval { .. }
                | Error::InvalidSchedule { .. }
                | Error::VenueNotFound { .. }
        )
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
