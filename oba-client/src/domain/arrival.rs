//! Predicted or scheduled bus arrivals at a stop.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

/// Headsign used when the API omits `tripHeadsign`.
pub const UNKNOWN_HEADSIGN: &str = "Unknown";

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Arrivals at most this many minutes away are [`ArrivalUrgency::Soon`].
pub const SOON_MINUTES: i64 = 5;

/// How close an arrival is, for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrivalUrgency {
    /// Due now or already passed.
    Now,
    /// Within [`SOON_MINUTES`].
    Soon,
    Later,
}

impl ArrivalUrgency {
    pub fn from_minutes(minutes: i64) -> Self {
        match minutes {
            m if m <= 0 => Self::Now,
            m if m <= SOON_MINUTES => Self::Soon,
            _ => Self::Later,
        }
    }
}

/// A vehicle visit to a stop for a given route and trip.
///
/// Timestamps are epoch milliseconds, as OneBusAway reports them.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    route_id: String,
    route_name: String,
    trip_headsign: String,
    predicted_arrival_ms: Option<i64>,
    scheduled_arrival_ms: i64,
    distance_from_stop: Option<f64>,
}

impl Arrival {
    pub(crate) fn new(
        route_id: String,
        route_name: String,
        trip_headsign: Option<String>,
        predicted_arrival_ms: Option<i64>,
        scheduled_arrival_ms: i64,
        distance_from_stop: Option<f64>,
    ) -> Self {
        Self {
            route_id,
            route_name,
            trip_headsign: trip_headsign.unwrap_or_else(|| UNKNOWN_HEADSIGN.to_string()),
            predicted_arrival_ms,
            scheduled_arrival_ms,
            distance_from_stop,
        }
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    /// Rider-facing route name, e.g. "45".
    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn trip_headsign(&self) -> &str {
        &self.trip_headsign
    }

    /// Real-time prediction, when the vehicle is being tracked.
    pub fn predicted_arrival_ms(&self) -> Option<i64> {
        self.predicted_arrival_ms
    }

    pub fn scheduled_arrival_ms(&self) -> i64 {
        self.scheduled_arrival_ms
    }

    /// Distance of the vehicle from the stop in meters.
    pub fn distance_from_stop(&self) -> Option<f64> {
        self.distance_from_stop
    }

    /// Whether the arrival time comes from a real-time prediction.
    pub fn is_predicted(&self) -> bool {
        self.predicted_arrival_ms.is_some()
    }

    /// Best known arrival time: the prediction if present, else the schedule.
    pub fn arrival_ms(&self) -> i64 {
        self.predicted_arrival_ms.unwrap_or(self.scheduled_arrival_ms)
    }

    /// Best known arrival time as a UTC datetime.
    ///
    /// Returns `None` only for timestamps chrono cannot represent.
    pub fn arrival_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.arrival_ms())
    }

    /// Whole minutes until arrival, truncated toward zero.
    ///
    /// Negative for vehicles that have already passed. Saturates for
    /// timestamps at the ends of the `i64` range.
    pub fn minutes_until(&self, now: DateTime<Utc>) -> i64 {
        self.arrival_ms().saturating_sub(now.timestamp_millis()) / MILLIS_PER_MINUTE
    }

    pub fn urgency(&self, now: DateTime<Utc>) -> ArrivalUrgency {
        ArrivalUrgency::from_minutes(self.minutes_until(now))
    }

    /// Compact label for arrival lists: "NOW" or "N min".
    pub fn list_label(&self, now: DateTime<Utc>) -> String {
        match self.minutes_until(now) {
            m if m <= 0 => "NOW".to_string(),
            m => format!("{m} min"),
        }
    }

    /// Headline for the arrival detail view.
    pub fn arriving_text(&self, now: DateTime<Utc>) -> String {
        match self.minutes_until(now) {
            m if m <= 0 => "Arriving now".to_string(),
            m => format!("Arriving in {m} minutes"),
        }
    }

    /// "Predicted: 9:05 AM" or "Scheduled: 9:05 AM", in the given zone.
    ///
    /// `None` when the timestamp is out of chrono's range.
    pub fn time_label<Tz>(&self, tz: &Tz) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let kind = if self.is_predicted() {
            "Predicted"
        } else {
            "Scheduled"
        };
        let local = self.arrival_at()?.with_timezone(tz);
        Some(format!("{kind}: {}", local.format("%-I:%M %p")))
    }

    /// "Bus is 120.5 meters away", when the distance is known.
    pub fn distance_text(&self) -> Option<String> {
        self.distance_from_stop.map(|d| format!("Bus is {d:.1} meters away"))
    }

    /// Short countdown text: "Due now" or "N min".
    pub fn countdown(&self, now: DateTime<Utc>) -> String {
        match self.minutes_until(now) {
            m if m <= 0 => "Due now".to_string(),
            m => format!("{m} min"),
        }
    }

    /// Borrowing adapter that renders the full arrival line at `now`.
    pub fn display_at(&self, now: DateTime<Utc>) -> ArrivalDisplay<'_> {
        ArrivalDisplay { arrival: self, now }
    }
}

/// Formats an [`Arrival`] as "route - headsign: countdown".
pub struct ArrivalDisplay<'a> {
    arrival: &'a Arrival,
    now: DateTime<Utc>,
}

impl fmt::Display for ArrivalDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}: {}",
            self.arrival.route_name,
            self.arrival.trip_headsign,
            self.arrival.countdown(self.now)
        )
    }
}

/// Sort arrivals soonest first, keeping response order for ties.
pub fn sort_by_minutes_until(arrivals: &mut [Arrival], now: DateTime<Utc>) {
    arrivals.sort_by_key(|a| a.minutes_until(now));
}
