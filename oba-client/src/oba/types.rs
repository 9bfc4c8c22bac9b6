//! OneBusAway API response DTOs.
//!
//! These types map directly to the JSON the `api/where` endpoints return.
//! Optional fields use `Option`, which covers both an absent key and an
//! explicit `null`.

use serde::Deserialize;

/// Envelope wrapped around every OneBusAway response.
///
/// `data` is kept as raw JSON until `code` has been checked, because error
/// responses carry an empty or differently shaped payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// API status code; 200 on success.
    pub code: i64,

    /// Human-readable status text ("OK", "resource not found", ...).
    pub text: Option<String>,

    /// Server time in epoch milliseconds.
    pub current_time: Option<i64>,

    /// Response format version.
    pub version: Option<i64>,

    #[serde(default)]
    pub data: serde_json::Value,
}

/// `data` shape for single-entity endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryData<T> {
    pub entry: T,
}

/// `data` shape for list endpoints such as `stops-for-location`.
///
/// Items stay as raw JSON so that one malformed element can be skipped
/// without rejecting the rest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListData {
    pub list: Option<Vec<serde_json::Value>>,

    /// Set when the server truncated the result set.
    pub limit_exceeded: Option<bool>,
}

/// A stop as returned by `stop/{id}.json` and `stops-for-location.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopEntry {
    pub id: String,

    pub name: String,

    /// Rider-facing stop code.
    pub code: Option<String>,

    pub lat: f64,

    pub lon: f64,

    /// Compass direction of travel at the stop.
    pub direction: Option<String>,
}

/// `entry` of `arrivals-and-departures-for-stop/{id}.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalsEntry {
    pub stop_id: Option<String>,

    /// Raw items; see [`ArrivalAndDeparture`].
    pub arrivals_and_departures: Option<Vec<serde_json::Value>>,
}

/// One element of `arrivalsAndDepartures`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalAndDeparture {
    pub route_id: String,

    pub route_short_name: String,

    pub trip_headsign: Option<String>,

    /// Real-time prediction (epoch ms), null when the bus isn't tracked.
    pub predicted_arrival_time: Option<i64>,

    /// Timetable arrival (epoch ms).
    pub scheduled_arrival_time: i64,

    /// Meters between the vehicle and the stop.
    pub distance_from_stop: Option<f64>,
}
