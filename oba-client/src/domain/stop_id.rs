//! Stop identifier type.

use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an invalid stop identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id {input:?}: {reason}")]
pub struct InvalidStopId {
    input: String,
    reason: &'static str,
}

/// An agency-scoped OneBusAway stop identifier, e.g. `1_10914`.
///
/// The identifier is interpolated into request paths, so whitespace and
/// URL-reserved characters are rejected at construction.
///
/// # Examples
///
/// ```
/// use oba_client::domain::StopId;
///
/// let stop = StopId::parse("1_10914").unwrap();
/// assert_eq!(stop.as_str(), "1_10914");
/// assert_eq!(stop.agency(), Some("1"));
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("1_109 14").is_err());
/// assert!(StopId::parse("../stop").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop identifier from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        let reject = |reason| InvalidStopId {
            input: s.to_string(),
            reason,
        };

        if s.is_empty() {
            return Err(reject("must not be empty"));
        }

        if s.chars().any(char::is_whitespace) {
            return Err(reject("must not contain whitespace"));
        }

        if s.chars().any(|c| matches!(c, '/' | '?' | '#' | '&' | '%')) {
            return Err(reject("must not contain URL-reserved characters"));
        }

        Ok(StopId(s.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The agency prefix (the part before the first `_`), if any.
    pub fn agency(&self) -> Option<&str> {
        self.0.split_once('_').map(|(agency, _)| agency)
    }
}

impl FromStr for StopId {
    type Err = InvalidStopId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
