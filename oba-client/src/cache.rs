//! Caching layer for the station list.
//!
//! The station list changes rarely but costs one request per stop, with a
//! pause between each, so the whole batch is kept for a few minutes. There
//! is a single slot per client: no keys, and no way to invalidate it other
//! than waiting for it to expire.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::oba::StationBatch;

/// Default validity of a cached station list.
pub const DEFAULT_STATION_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached batch and when its fetch began.
struct CachedStations {
    batch: Arc<StationBatch>,
    fetched_at: DateTime<Utc>,
}

/// Single-slot cache for the station list.
///
/// The slot lock is held for the whole check-fetch-store sequence, so
/// concurrent callers share one fetch: later callers wait and then find the
/// fresh entry.
pub struct StationCache {
    ttl: chrono::Duration,
    slot: Mutex<Option<CachedStations>>,
}

impl StationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            slot: Mutex::new(None),
        }
    }

    /// Return the cached batch if it is fresh, otherwise run `fetch`.
    ///
    /// A fetched batch replaces the slot only if it is cacheable (see
    /// [`StationBatch::is_cacheable`]); either way it is returned.
    pub async fn get_or_fetch<C, F, Fut>(&self, clock: &C, fetch: F) -> Arc<StationBatch>
    where
        C: Clock + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StationBatch>,
    {
        let mut slot = self.slot.lock().await;
        let now = clock.now();

        if let Some(cached) = slot.as_ref()
            && self.is_fresh(cached.fetched_at, now)
        {
            debug!(
                stations = cached.batch.stations.len(),
                "using cached station list"
            );
            return Arc::clone(&cached.batch);
        }

        let batch = Arc::new(fetch().await);

        if batch.is_cacheable() {
            *slot = Some(CachedStations {
                batch: Arc::clone(&batch),
                fetched_at: now,
            });
        } else {
            warn!(
                skipped = batch.skipped.len(),
                "every stop failed; not caching station list"
            );
        }

        batch
    }

    /// Age of the cached entry at `now`, if there is one.
    pub async fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let slot = self.slot.lock().await;
        slot.as_ref().map(|cached| now.signed_duration_since(cached.fetched_at))
    }

    /// Cache TTL.
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(fetched_at) < self.ttl
    }
}

impl Default for StationCache {
    fn default() -> Self {
        Self::new(DEFAULT_STATION_TTL)
    }
}
