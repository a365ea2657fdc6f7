//! Slot grid derivation.
//!
//! Two pure computations live here and must stay in lockstep, because
//! reservation and release rely on walking exactly the keys generation wrote:
//!
//! - [`slots_for_date`]: the grid for one venue on one date, from its weekly
//!   operating hours.
//! - [`booking_slot_times`]: the ordered slot start times a booking interval
//!   spans, at the same granularity.
//!
//! Both advance by whole `slot_duration` steps; a trailing partial period
//! before closing time is dropped, never padded.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::{Error, Result};
use crate::store::SlotRecord;
use crate::venue::{Venue, weekday_name};

fn check_duration(slot_duration: u32) -> Result<Duration> {
    if slot_duration == 0 {
        return Err(Error::Other(anyhow::anyhow!("venue slot_duration must be positive")));
    }
    Ok(Duration::minutes(i64::from(slot_duration)))
}

/// Generate the slot grid for `venue` on `date`.
///
/// A missing weekday entry or a day marked closed produces an empty grid,
/// not an error. Malformed operating-hours strings propagate and fail the
/// whole date.
pub fn slots_for_date(venue: &Venue, date: NaiveDate) -> Result<Vec<SlotRecord>> {
    let step = check_duration(venue.slot_duration)?;
    let day = weekday_name(date.weekday());

    let window = match venue.hours_for(date.weekday()) {
        Some(hours) => hours.window(day)?,
        None => None,
    };
    let Some((open, close)) = window else {
        return Ok(Vec::new());
    };

    // Walk in datetime space so the arithmetic cannot wrap at midnight.
    let close_at = date.and_time(close);
    let mut cursor = date.and_time(open);
    let mut slots = Vec::new();
    while cursor < close_at {
        slots.push(SlotRecord::fresh(venue.id, date, cursor.time(), venue.capacity));
        cursor += step;
    }
    Ok(slots)
}

/// Decompose a booking interval into the ordered slot start times it spans,
/// end-exclusive.
///
/// Multi-day bookings are unsupported: every spanned slot must sit on the
/// start's calendar date. An end of exactly midnight on the following day is
/// fine because the walk never reaches it.
pub fn booking_slot_times(start: NaiveDateTime, end: NaiveDateTime, slot_duration: u32) -> Result<Vec<NaiveTime>> {
    let step = check_duration(slot_duration)?;

    if start >= end {
        return Err(Error::InvalidInterval {
            message: format!("start ({start}) must be before end ({end})"),
        });
    }

    let next_midnight = start
        .date()
        .succ_opt()
        .map(|d| d.and_time(NaiveTime::MIN))
        .ok_or_else(|| Error::InvalidInterval {
            message: format!("date out of range: {}", start.date()),
        })?;
    if end > next_midnight {
        return Err(Error::InvalidInterval {
            message: format!("booking may not cross midnight (start {start}, end {end})"),
        });
    }

    let mut times = Vec::new();
    let mut cursor = start;
    while cursor < end {
        times.push(cursor.time());
        cursor += step;
    }
    Ok(times)
}
