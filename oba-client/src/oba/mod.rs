//! OneBusAway REST client.
//!
//! This module provides an HTTP client for the OneBusAway `api/where`
//! endpoints, which serve stop details and real-time arrival predictions.
//!
//! Key characteristics of OneBusAway:
//! - Every response is wrapped in an envelope whose `code` mirrors an HTTP
//!   status; a 200 HTTP response can still carry an error code
//! - Timestamps are epoch milliseconds
//! - Public servers rate limit aggressively (HTTP 429), so requests are
//!   spaced out and retried with exponential backoff

mod client;
mod convert;
mod error;
mod mock;
mod retry;
mod transport;
mod types;

#[cfg(test)]
mod client_tests;

pub use client::{
    DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_STOP_IDS, ObaConfig, SkippedStop, StationBatch,
    TransitClient, default_stop_ids,
};
pub use convert::{
    ConversionError, parse_arrivals_response, parse_envelope, parse_stop_response,
    parse_stops_for_location,
};
pub use error::{ObaError, RATE_LIMIT_MESSAGE};
pub use mock::{MockResponse, MockTransport};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, ObaRequest, Transport, error_for_status};
pub use types::{ArrivalAndDeparture, ArrivalsEntry, ResponseEnvelope, StopEntry};
