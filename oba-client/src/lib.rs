//! OneBusAway transit data client.
//!
//! Looks up nearby bus stops and their real-time arrival predictions from a
//! OneBusAway server, with retry on rate limiting and a short-lived cache of
//! the station list.

pub mod cache;
pub mod clock;
pub mod domain;
pub mod oba;
