//! Conversion from OneBusAway DTOs to domain types.
//!
//! Each response is first checked at the envelope level (`code` must be
//! 200), then its payload is decoded and validated. List payloads are
//! converted element by element; a bad element is logged and skipped
//! rather than failing the whole response.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{Arrival, InvalidStopId, Station, StopId};

use super::error::ObaError;
use super::types::{
    ArrivalAndDeparture, ArrivalsEntry, EntryData, ListData, ResponseEnvelope, StopEntry,
};

/// The only envelope code treated as success.
const API_OK: i64 = 200;

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    #[error(transparent)]
    InvalidStopId(#[from] InvalidStopId),

    /// Coordinates outside the valid lat/lon range
    #[error("coordinates out of range: ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

/// Check the envelope and return its `data` payload.
pub fn parse_envelope(body: &str) -> Result<serde_json::Value, ObaError> {
    let envelope: ResponseEnvelope =
        serde_json::from_str(body).map_err(|e| ObaError::json(e, Some(body)))?;

    if envelope.code != API_OK {
        return Err(ObaError::ApiCode {
            code: envelope.code,
            text: envelope.text.unwrap_or_default(),
        });
    }

    Ok(envelope.data)
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ObaError> {
    serde_json::from_value(value).map_err(|e| ObaError::json(e, None))
}

/// Parse a `stop/{id}.json` response into a station.
pub fn parse_stop_response(body: &str) -> Result<Station, ObaError> {
    let data = parse_envelope(body)?;
    let data: EntryData<StopEntry> = decode(data)?;
    convert_stop(data.entry).map_err(|e| ObaError::json(e, None))
}

/// Parse an `arrivals-and-departures-for-stop/{id}.json` response.
///
/// Arrivals are returned in response order. A missing
/// `arrivalsAndDepartures` array yields an empty list.
pub fn parse_arrivals_response(body: &str) -> Result<Vec<Arrival>, ObaError> {
    let data = parse_envelope(body)?;
    let data: EntryData<ArrivalsEntry> = decode(data)?;

    let items = data.entry.arrivals_and_departures.unwrap_or_default();
    let mut arrivals = Vec::with_capacity(items.len());

    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<ArrivalAndDeparture>(item) {
            Ok(dto) => arrivals.push(convert_arrival(dto)),
            Err(e) => warn!(index = idx, error = %e, "skipping malformed arrival"),
        }
    }

    Ok(arrivals)
}

/// Parse a `stops-for-location.json` response.
pub fn parse_stops_for_location(body: &str) -> Result<Vec<Station>, ObaError> {
    let data = parse_envelope(body)?;
    let data: ListData = decode(data)?;

    if data.limit_exceeded == Some(true) {
        warn!("stops-for-location result was truncated by the server");
    }

    let items = data.list.unwrap_or_default();
    let mut stations = Vec::with_capacity(items.len());

    for (idx, item) in items.into_iter().enumerate() {
        let converted = serde_json::from_value::<StopEntry>(item)
            .map_err(|e| e.to_string())
            .and_then(|dto| convert_stop(dto).map_err(|e| e.to_string()));

        match converted {
            Ok(station) => stations.push(station),
            Err(e) => warn!(index = idx, error = %e, "skipping malformed stop"),
        }
    }

    Ok(stations)
}

/// Convert a stop DTO, validating its id and coordinates.
pub fn convert_stop(dto: StopEntry) -> Result<Station, ConversionError> {
    let id = StopId::parse(&dto.id)?;

    if !(-90.0..=90.0).contains(&dto.lat) || !(-180.0..=180.0).contains(&dto.lon) {
        return Err(ConversionError::InvalidCoordinates {
            lat: dto.lat,
            lon: dto.lon,
        });
    }

    Ok(Station::new(
        id,
        dto.name,
        dto.code,
        dto.lat,
        dto.lon,
        dto.direction,
    ))
}

pub fn convert_arrival(dto: ArrivalAndDeparture) -> Arrival {
    Arrival::new(
        dto.route_id,
        dto.route_short_name,
        dto.trip_headsign,
        dto.predicted_arrival_time,
        dto.scheduled_arrival_time,
        dto.distance_from_stop,
    )
}
