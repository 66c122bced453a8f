//! Turns a selected trip and a raw stop-time table into the ordered list
//! of stops the vehicle has not reached yet, joined with stop metadata.

use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{Local, Timelike};
use serde::Serialize;

use crate::butter::entities::{Stop, StopTime};

/// A GTFS wall-clock time of day. Hours may exceed 23 for trips that run
/// past midnight (a stop at "24:10:00" belongs to the previous service
/// day), per the stop_times.txt rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    hours: u32,
    minutes: u32,
    seconds: u32,
}

impl TimeOfDay {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> TimeOfDay {
        TimeOfDay {
            hours,
            minutes,
            seconds,
        }
    }

    /// The current local wall-clock time.
    pub fn now_local() -> TimeOfDay {
        let now = Local::now();
        TimeOfDay::new(now.hour(), now.minute(), now.second())
    }

    pub fn seconds_since_midnight(&self) -> u32 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TimeParseError {
    #[error("Expected HH:MM:SS, got {0:?}")]
    Format(String),

    #[error("Invalid number in time: {0}")]
    Number(#[from] ParseIntError),
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(m), Some(sec), None) => {
                let time = TimeOfDay::new(h.parse()?, m.parse()?, sec.parse()?);
                if time.minutes > 59 || time.seconds > 59 {
                    return Err(TimeParseError::Format(s.to_string()));
                }
                Ok(time)
            }
            _ => Err(TimeParseError::Format(s.to_string())),
        }
    }
}

/// A stop the selected trip is still due to call at, merged with its
/// scheduled times. The stop display fields are absent when the stop id
/// has no record in the dataset; the times are always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStop {
    pub stop_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_lon: Option<f64>,
    pub arrival_time: String,
    pub departure_time: String,
}

/// Returns the stops the trip has not passed yet, in the stop-time table's
/// own order. An unknown trip id yields an empty list, as does a trip
/// whose stops have all gone by.
///
/// The comparison is time-of-day only, inclusive at the boundary: a stop
/// whose arrival equals `now` is still upcoming. A stop scheduled at
/// 00:10 counts as passed once the clock is past 00:10 even if the trip
/// started the previous evening; feeds encode such stops as hours >= 24,
/// which compares as written here.
pub fn resolve_upcoming_stops(
    trip_id: &str,
    stop_times: &[StopTime],
    stops: &[Stop],
    now: TimeOfDay,
) -> Vec<ResolvedStop> {
    let now_seconds = now.seconds_since_midnight();

    stop_times
        .iter()
        .filter(|st| st.trip_id == trip_id)
        .filter(|st| match st.arrival_time.parse::<TimeOfDay>() {
            Ok(arrival) => arrival.seconds_since_midnight() >= now_seconds,
            Err(e) => {
                log::warn!(
                    "Skipping stop {} with unparseable arrival {:?}: {}",
                    st.stop_id,
                    st.arrival_time,
                    e
                );
                false
            }
        })
        .map(|st| {
            let stop = stops.iter().find(|s| s.stop_id == st.stop_id);
            ResolvedStop {
                stop_id: st.stop_id.clone(),
                stop_name: stop.map(|s| s.stop_name.clone()),
                stop_lat: stop.and_then(|s| s.stop_lat),
                stop_lon: stop.and_then(|s| s.stop_lon),
                arrival_time: st.arrival_time.clone(),
                departure_time: st.departure_time.clone(),
            }
        })
        .collect()
}
