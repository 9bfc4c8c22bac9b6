//! Domain types for the transit client.
//!
//! Values here are validated when they are built from API responses, so
//! code receiving them can trust their contents.

mod area;
mod arrival;
mod station;
mod stop_id;

pub use area::ServiceArea;
pub use arrival::{
    Arrival, ArrivalDisplay, ArrivalUrgency, SOON_MINUTES, UNKNOWN_HEADSIGN, sort_by_minutes_until,
};
pub use station::Station;
pub use stop_id::{InvalidStopId, StopId};
