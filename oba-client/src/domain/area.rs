//! Coarse service-area check for the user's location.

/// Centre of the default service area (downtown Seattle).
const SEATTLE_LAT: f64 = 47.6062;
const SEATTLE_LON: f64 = -122.3321;

/// Default half-width of the service area in degrees (roughly 30 km).
const DEFAULT_HALF_WIDTH_DEG: f64 = 0.3;

/// A lat/lon box around a centre point.
///
/// Used to decide whether a device location is close enough to the
/// configured transit region to be useful, falling back to the centre
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceArea {
    pub center_lat: f64,
    pub center_lon: f64,
    pub half_width_deg: f64,
}

impl ServiceArea {
    pub fn new(center_lat: f64, center_lon: f64, half_width_deg: f64) -> Self {
        Self {
            center_lat,
            center_lon,
            half_width_deg,
        }
    }

    /// Whether a point lies strictly inside the box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (lat - self.center_lat).abs() < self.half_width_deg
            && (lon - self.center_lon).abs() < self.half_width_deg
    }

    /// The given location if it is inside the area, else the area's centre.
    pub fn clamp_location(&self, lat: f64, lon: f64) -> (f64, f64) {
        if self.contains(lat, lon) {
            (lat, lon)
        } else {
            (self.center_lat, self.center_lon)
        }
    }
}

impl Default for ServiceArea {
    fn default() -> Self {
        Self::new(SEATTLE_LAT, SEATTLE_LON, DEFAULT_HALF_WIDTH_DEG)
    }
}
