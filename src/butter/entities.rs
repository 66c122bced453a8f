//! Shapes of the records the Butter feed hands back. Realtime entities
//! follow the GTFS-realtime JSON encoding; static entities follow the
//! stop_times.txt / stops.txt column names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::serde_helpers::{deserialize_option_unix_date, MaybeStringWrapped};

/// One record from the realtime positions endpoint.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct FeedEntity {
    /// Unique within one feed message.
    pub id: String,
    pub is_deleted: Option<bool>,
    pub vehicle: Option<VehiclePosition>,
}

/// Realtime positioning information for a given vehicle.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct VehiclePosition {
    /// The trip this vehicle is serving. Can be empty or partial if the
    /// vehicle can not be matched to a trip instance.
    pub trip: Option<TripDescriptor>,
    /// Additional information on the vehicle that is serving this trip.
    pub vehicle: Option<VehicleDescriptor>,
    /// Current position. Absent when the vehicle has not reported one;
    /// such records are filtered before display, never rejected.
    pub position: Option<Position>,
    pub current_stop_sequence: Option<u32>,
    /// Identifies the current stop, as in stops.txt.
    pub stop_id: Option<String>,
    pub current_status: Option<VehicleStopStatus>,
    /// Moment at which the position was measured, in POSIX seconds.
    #[serde(
        default,
        deserialize_with = "deserialize_option_unix_date",
        skip_serializing
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum VehicleStopStatus {
    IncomingAt = 0,
    StoppedAt = 1,
    InTransitTo = 2,
}

/// A descriptor that identifies an instance of a GTFS trip.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct TripDescriptor {
    /// For non frequency-based trips, this field alone identifies the trip.
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub direction_id: Option<u32>,
    /// e.g. 11:15:35 or 25:15:35.
    pub start_time: Option<String>,
    /// In YYYYMMDD format.
    pub start_date: Option<String>,
}

/// Identification information for the vehicle performing the trip.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct VehicleDescriptor {
    pub id: Option<String>,
    /// User visible label, i.e., something that can be shown to the
    /// passenger to help identify the correct vehicle.
    pub label: Option<String>,
    pub license_plate: Option<String>,
}

/// A WGS-84 position.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Degrees clockwise from North. Not supposed to be a string, but
    /// sometimes seems to be.
    pub bearing: Option<MaybeStringWrapped<f32>>,
    /// Momentary speed in meters per second.
    pub speed: Option<f32>,
}

/// One row of the dataset's stop-time table. Belongs to exactly one trip.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    /// Scheduled arrival as a wall-clock HH:MM:SS, no date, no timezone.
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_sequence: Option<u32>,
    pub stop_headsign: Option<String>,
}

/// Stop metadata, keyed by stop id, independent of trip.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Stop {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_code: Option<String>,
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
}
