//! Venue records, as seen by the capacity core.
//!
//! Venue CRUD lives with an external collaborator; this module only models
//! the fields the slot generator reads (capacity, weekly operating hours,
//! slot duration) and the directory seam used to resolve a venue id.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::{Error, Result};

pub const DEFAULT_SLOT_DURATION_MINUTES: u32 = 60;

/// Operating hours for one weekday, in the upstream wire shape:
/// `{ "open": true, "start": "09:00", "end": "17:00" }`. A missing weekday
/// entry or `open: false` means the venue is closed that day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHours {
    #[serde(default = "default_open")]
    pub open: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

fn default_open() -> bool {
    true
}

impl DayHours {
    pub fn closed() -> Self {
        Self {
            open: false,
            start: None,
            end: None,
        }
    }

    pub fn open(start: &str, end: &str) -> Self {
        Self {
            open: true,
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        }
    }

    /// Parse the open/close pair, or `None` when the day is closed.
    ///
    /// Malformed or missing time strings on an open day are an error, not a
    /// silent skip: one bad weekday must fail generation for its dates.
    pub fn window(&self, day: &str) -> Result<Option<(NaiveTime, NaiveTime)>> {
        if !self.open {
            return Ok(None);
        }
        let start = parse_wall_clock(day, self.start.as_deref())?;
        let end = parse_wall_clock(day, self.end.as_deref())?;
        Ok(Some((start, end)))
    }
}

fn parse_wall_clock(day: &str, value: Option<&str>) -> Result<NaiveTime> {
    let raw = value.ok_or_else(|| Error::InvalidSchedule {
        day: day.to_string(),
        value: String::from("<missing>"),
    })?;
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| Error::InvalidSchedule {
        day: day.to_string(),
        value: raw.to_string(),
    })
}

/// The venue fields the capacity core reads. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: Uuid,
    /// Bookable units per slot; fixed into each generated row's `total_capacity`
    pub capacity: i32,
    /// Lowercase weekday name -> hours for that day
    #[serde(default)]
    pub operating_hours: HashMap<String, DayHours>,
    /// Slot granularity in minutes
    #[serde(default = "default_slot_duration")]
    pub slot_duration: u32,
}

fn default_slot_duration() -> u32 {
    DEFAULT_SLOT_DURATION_MINUTES
}

impl Venue {
    /// Hours entry for the weekday, if the venue knows that day at all
    pub fn hours_for(&self, weekday: Weekday) -> Option<&DayHours> {
        self.operating_hours.get(weekday_name(weekday))
    }
}

/// Lowercase weekday name used as the operating-hours map key
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Resolves venue ids to venue records. The booking platform's venue
/// management owns the data; implementations here are read-only views.
#[async_trait::async_trait]
pub trait VenueDirectory: Send + Sync {
    async fn get(&self, venue_id: Uuid) -> Result<Option<Venue>>;
}

/// Directory over a fixed set of venues (config-defined, or test fixtures)
#[derive(Debug, Default)]
pub struct StaticVenueDirectory {
    venues: HashMap<Uuid, Venue>,
}

impl StaticVenueDirectory {
    pub fn new(venues: impl IntoIterator<Item = Venue>) -> Self {
        Self {
            venues: venues.into_iter().map(|v| (v.id, v)).collect(),
        }
    }
}

#[async_trait::async_trait]
impl VenueDirectory for StaticVenueDirectory {
    async fn get(&self, venue_id: Uuid) -> Result<Option<Venue>> {
        Ok(self.venues.get(&venue_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_parses_open_day() {
        let hours = DayHours::open("09:00", "17:30");
        let (start, end) = hours.window("monday").unwrap().unwrap();
        assert_eq!(start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(17, 30, 0).unwrap());
    }

    #[test]
    fn window_closed_day_is_none() {
        assert!(DayHours::closed().window("sunday").unwrap().is_none());
    }

    #[test]
    fn window_rejects_malformed_time() {
        let hours = DayHours::open("9am", "17:00");
        let err = hours.window("monday").unwrap_err();
        assert!(matches!(err, Error::InvalidSchedule { ref day, ref value } if day == "monday" && value == "9am"));
    }

    #[test]
    fn window_rejects_open_day_without_times() {
        let hours = DayHours {
            open: true,
            start: None,
            end: None,
        };
        assert!(hours.window("friday").is_err());
    }

    #[test]
    fn day_hours_wire_shape() {
        let hours: DayHours = serde_json::from_str(r#"{"start": "08:00", "end": "18:00"}"#).unwrap();
        assert!(hours.open);
        let hours: DayHours = serde_json::from_str(r#"{"open": false}"#).unwrap();
        assert!(hours.window("tuesday").unwrap().is_none());
    }
}
