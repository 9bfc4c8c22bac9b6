//! Bus station (stop) type.

use std::fmt;

use super::StopId;

/// A transit stop as reported by the OneBusAway `stop` endpoint.
///
/// Stations are only built from API responses and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    id: StopId,
    name: String,
    code: Option<String>,
    lat: f64,
    lon: f64,
    direction: Option<String>,
}

impl Station {
    pub(crate) fn new(
        id: StopId,
        name: String,
        code: Option<String>,
        lat: f64,
        lon: f64,
        direction: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            code,
            lat,
            lon,
            direction,
        }
    }

    /// Stable stop identifier.
    pub fn id(&self) -> &StopId {
        &self.id
    }

    /// Display name, e.g. "15th Ave NE & NE Campus Pkwy".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short rider-facing stop code, if the agency publishes one.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Compass direction label (e.g. "N", "SW").
    pub fn direction(&self) -> Option<&str> {
        self.direction.as_deref()
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Code: {}, Direction: {})",
            self.name,
            self.code.as_deref().unwrap_or("N/A"),
            self.direction.as_deref().unwrap_or("N/A")
        )
    }
}
