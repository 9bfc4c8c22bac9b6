//! OneBusAway transit client.
//!
//! Fetches stop details and arrival predictions, retrying rate-limited and
//! server-side failures and caching the station list.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{DEFAULT_STATION_TTL, StationCache};
use crate::clock::{Clock, SystemClock};
use crate::domain::{Arrival, Station, StopId, sort_by_minutes_until};

use super::convert::{parse_arrivals_response, parse_stop_response, parse_stops_for_location};
use super::error::{ObaError, RATE_LIMIT_MESSAGE};
use super::retry::RetryPolicy;
use super::transport::{HttpTransport, ObaRequest, Transport};

/// Default base URL (Puget Sound OneBusAway).
pub const DEFAULT_BASE_URL: &str = "https://api.pugetsound.onebusaway.org/api/where";

/// Public test key accepted by the Puget Sound server.
pub const DEFAULT_API_KEY: &str = "TEST";

/// Stops fetched when no other list is configured (University District).
pub const DEFAULT_STOP_IDS: [&str; 5] = [
    "1_10914", // 15th Ave NE & NE Campus Pkwy
    "1_11160", // 15th Ave NE & NE 55th St
    "1_11370", // 15th Ave NE & NE 45th St
    "1_10346", // University Way NE & NE 50th St
    "1_10380", // University Way NE & NE 45th St
];

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Pause between consecutive stop requests.
const DEFAULT_REQUEST_SPACING: Duration = Duration::from_secs(1);

/// Pause before a user-triggered retry.
const DEFAULT_USER_RETRY_DELAY: Duration = Duration::from_secs(3);

const DEFAULT_MINUTES_BEFORE: u32 = 0;
const DEFAULT_MINUTES_AFTER: u32 = 60;

/// Configuration for the transit client.
#[derive(Debug, Clone)]
pub struct ObaConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Stops fetched by `fetch_stations`
    pub stop_ids: Vec<StopId>,
    /// Connect and read timeout in seconds
    pub timeout_secs: u64,
    /// Backoff policy applied to every request
    pub retry: RetryPolicy,
    /// Pause between consecutive stop requests
    pub request_spacing: Duration,
    /// How long a fetched station list stays valid
    pub station_ttl: Duration,
    /// Pause before a user-triggered refetch
    pub user_retry_delay: Duration,
    /// Arrivals window start, in minutes before now
    pub minutes_before: u32,
    /// Arrivals window end, in minutes after now
    pub minutes_after: u32,
}

impl ObaConfig {
    /// Create a new config with the given API key and defaults otherwise.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            stop_ids: default_stop_ids(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
            request_spacing: DEFAULT_REQUEST_SPACING,
            station_ttl: DEFAULT_STATION_TTL,
            user_retry_delay: DEFAULT_USER_RETRY_DELAY,
            minutes_before: DEFAULT_MINUTES_BEFORE,
            minutes_after: DEFAULT_MINUTES_AFTER,
        }
    }

    /// Set a custom base URL (for testing or other regions).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the stops fetched by `fetch_stations`.
    pub fn with_stop_ids(mut self, stop_ids: Vec<StopId>) -> Self {
        self.stop_ids = stop_ids;
        self
    }

    /// Set connect/read timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_spacing(mut self, spacing: Duration) -> Self {
        self.request_spacing = spacing;
        self
    }

    pub fn with_station_ttl(mut self, ttl: Duration) -> Self {
        self.station_ttl = ttl;
        self
    }

    pub fn with_user_retry_delay(mut self, delay: Duration) -> Self {
        self.user_retry_delay = delay;
        self
    }

    pub fn with_arrivals_window(mut self, minutes_before: u32, minutes_after: u32) -> Self {
        self.minutes_before = minutes_before;
        self.minutes_after = minutes_after;
        self
    }
}

impl Default for ObaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY)
    }
}

/// The built-in stop list.
pub fn default_stop_ids() -> Vec<StopId> {
    DEFAULT_STOP_IDS
        .iter()
        .filter_map(|id| StopId::parse(id).ok())
        .collect()
}

/// A stop that could not be fetched, and why.
#[derive(Debug)]
pub struct SkippedStop {
    pub stop_id: StopId,
    pub reason: ObaError,
}

/// Outcome of fetching the configured station list.
///
/// Stops that failed are listed in `skipped` instead of aborting the batch.
#[derive(Debug, Default)]
pub struct StationBatch {
    /// Successfully fetched stations, in configured order.
    pub stations: Vec<Station>,
    /// Stops that failed, with the reason each was left out.
    pub skipped: Vec<SkippedStop>,
}

impl StationBatch {
    /// Whether this batch may be stored in the station cache.
    ///
    /// False only when stops were requested and every one of them failed.
    pub fn is_cacheable(&self) -> bool {
        !self.stations.is_empty() || self.skipped.is_empty()
    }

    /// Text to show the user when the batch produced nothing useful.
    ///
    /// Returns `None` if any station was fetched, or if none were requested.
    pub fn failure_message(&self) -> Option<String> {
        if self.is_cacheable() {
            return None;
        }

        if self.skipped.iter().any(|s| s.reason.is_rate_limited()) {
            return Some(RATE_LIMIT_MESSAGE.to_string());
        }

        self.skipped
            .first()
            .map(|s| s.reason.user_message("stations"))
    }
}

/// OneBusAway transit client.
///
/// Generic over the [`Transport`] so tests can substitute a mock, and over
/// the [`Clock`] that drives cache expiry and arrival countdowns.
pub struct TransitClient<T = HttpTransport, C = SystemClock> {
    transport: T,
    clock: C,
    config: ObaConfig,
    cache: StationCache,
}

impl TransitClient {
    /// Create a client talking to the configured OneBusAway server.
    pub fn new(config: ObaConfig) -> Result<Self, ObaError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport, SystemClock))
    }
}

impl<T: Transport, C: Clock> TransitClient<T, C> {
    /// Create a client with an explicit transport and clock.
    pub fn with_transport(config: ObaConfig, transport: T, clock: C) -> Self {
        let cache = StationCache::new(config.station_ttl);
        Self {
            transport,
            clock,
            config,
            cache,
        }
    }

    pub fn config(&self) -> &ObaConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Perform one request under the retry policy.
    async fn request(&self, request: &ObaRequest) -> Result<String, ObaError> {
        let transport = &self.transport;
        self.config
            .retry
            .run(move || transport.get(request))
            .await
    }

    /// Fetch a single stop.
    pub async fn fetch_station(&self, stop_id: &StopId) -> Result<Station, ObaError> {
        let request = ObaRequest::new(format!("stop/{stop_id}.json"));
        let body = self.request(&request).await?;
        parse_stop_response(&body)
    }

    /// Fetch the configured stations, using the cached list while it is fresh.
    ///
    /// Never fails as a whole: stops that could not be fetched are recorded
    /// in [`StationBatch::skipped`]. While the cache is fresh the same `Arc`
    /// is returned and no requests are made.
    pub async fn fetch_stations(&self) -> Arc<StationBatch> {
        self.cache
            .get_or_fetch(&self.clock, move || self.fetch_station_batch())
            .await
    }

    async fn fetch_station_batch(&self) -> StationBatch {
        let mut batch = StationBatch::default();

        for (idx, stop_id) in self.config.stop_ids.iter().enumerate() {
            if idx > 0 && !self.config.request_spacing.is_zero() {
                tokio::time::sleep(self.config.request_spacing).await;
            }

            match self.fetch_station(stop_id).await {
                Ok(station) => batch.stations.push(station),
                Err(e) => {
                    warn!(stop = %stop_id, error = %e, "skipping stop");
                    batch.skipped.push(SkippedStop {
                        stop_id: stop_id.clone(),
                        reason: e,
                    });
                }
            }
        }

        info!(
            fetched = batch.stations.len(),
            skipped = batch.skipped.len(),
            "fetched station list"
        );

        batch
    }

    /// Fetch upcoming arrivals at a stop, soonest first.
    ///
    /// `Ok` with an empty list means the stop has no arrivals in the window;
    /// failures are returned as `Err`.
    pub async fn fetch_arrivals(&self, stop_id: &StopId) -> Result<Vec<Arrival>, ObaError> {
        let request = ObaRequest::new(format!("arrivals-and-departures-for-stop/{stop_id}.json"))
            .param("minutesBefore", self.config.minutes_before)
            .param("minutesAfter", self.config.minutes_after);

        let result = self
            .request(&request)
            .await
            .and_then(|body| parse_arrivals_response(&body));

        match result {
            Ok(mut arrivals) => {
                sort_by_minutes_until(&mut arrivals, self.clock.now());
                Ok(arrivals)
            }
            Err(e) => {
                warn!(stop = %stop_id, error = %e, "failed to fetch arrivals");
                Err(e)
            }
        }
    }

    /// Fetch stops within `radius_m` meters of a point. Not cached.
    pub async fn fetch_stations_near(
        &self,
        lat: f64,
        lon: f64,
        radius_m: u32,
    ) -> Result<Vec<Station>, ObaError> {
        let request = ObaRequest::new("stops-for-location.json")
            .param("lat", lat)
            .param("lon", lon)
            .param("radius", radius_m);

        let body = self.request(&request).await?;
        parse_stops_for_location(&body)
    }

    /// Wait the user-retry delay, then fetch stations.
    pub async fn refetch_stations(&self) -> Arc<StationBatch> {
        tokio::time::sleep(self.config.user_retry_delay).await;
        self.fetch_stations().await
    }

    /// Wait the user-retry delay, then fetch arrivals.
    pub async fn refetch_arrivals(&self, stop_id: &StopId) -> Result<Vec<Arrival>, ObaError> {
        tokio::time::sleep(self.config.user_retry_delay).await;
        self.fetch_arrivals(stop_id).await
    }
}
