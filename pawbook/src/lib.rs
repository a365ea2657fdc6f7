//! # pawbook: Slot capacity core for dog-care bookings
//!
//! `pawbook` is the capacity-accounting subsystem of a booking platform for
//! dog-care venues. It owns the slot table (one row per bookable time unit at
//! a venue, with a capacity counter), generates that table from each venue's
//! weekly operating hours, and answers the two questions booking management
//! asks: "can this multi-hour booking be seated?" and "this booking was
//! cancelled, give the capacity back".
//!
//! ## Overview
//!
//! A booking spans a contiguous run of fixed-duration slots on one calendar
//! date. Reserving it means claiming one unit from every spanned slot, or
//! claiming none: the [`reservation::ReservationEngine`] walks the slots in
//! chronological order issuing conditional decrements through the
//! [`store::SlotStore`] trait, and compensates any partial progress the
//! moment a slot comes up short. There is deliberately no cross-row
//! transaction; correctness under concurrent requests rests entirely on the
//! store backend linearizing conditional updates per row, which keeps the
//! design portable across key-value stores without multi-row transaction
//! support.
//!
//! Release on cancellation is the asymmetric twin: best-effort per slot,
//! guarded so a duplicate release cannot drive availability above capacity,
//! and never allowed to block the cancellation itself.
//!
//! ## Components
//!
//! - [`store`]: the slot table behind the [`store::SlotStore`] trait, with
//!   in-memory and PostgreSQL backends
//! - [`schedule`]: pure slot-grid math (generation grid and booking-interval
//!   decomposition, which must agree)
//! - [`generator`]: batch population of the table per venue and date range
//! - [`reservation`]: atomic reserve with compensating rollback, best-effort
//!   release
//! - [`availability`]: read-only discovery and management views
//! - [`service`]: the facade booking management calls, resolving venues via
//!   [`venue::VenueDirectory`]
//!
//! Owner/dog/venue CRUD, authentication, and payments live with external
//! collaborators; this crate only models the venue fields the generator
//! reads.

pub mod availability;
pub mod config;
pub mod errors;
pub mod generator;
pub mod reservation;
pub mod schedule;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod venue;

pub use config::{Args, Config};
pub use errors::{Error, Result};
pub use service::CapacityService;
