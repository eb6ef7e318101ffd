//! Time-bounded storage for the current [`RateTable`].

use std::fmt::{self, Display, Formatter};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::rates::RateTable;

/// Why the fallback table is being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No live price feed is configured.
    NotConfigured,
    /// The feed failed (transport, status or payload error).
    FetchFailed,
    /// The feed did not answer within the fetch timeout.
    Timeout,
}

impl Display for FallbackReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotConfigured => "not_configured",
            Self::FetchFailed => "fetch_failed",
            Self::Timeout => "timeout",
        })
    }
}

/// Where a [`RateTable`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    /// Prices fetched from the live feed.
    Live,
    /// Configured defaults, served because the feed was unavailable.
    Fallback {
        /// Why the feed was unavailable.
        reason: FallbackReason,
    },
}

impl RateSource {
    /// Returns `true` for [`RateSource::Live`].
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

/// A rate table together with its provenance and fetch time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSnapshot {
    /// The prices.
    pub rates: RateTable,
    /// Whether the prices are live or fallback defaults.
    pub source: RateSource,
    /// When the snapshot was taken.
    pub fetched_at: Instant,
}

impl RateSnapshot {
    /// Time elapsed since the snapshot was taken, as seen at `now`.
    #[must_use]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// Returns `true` while the snapshot is younger than `ttl`.
    #[must_use]
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Holds at most one [`RateSnapshot`].
///
/// Writes replace the snapshot wholesale. The lock is only held to copy the
/// snapshot in or out, never while fetching.
#[derive(Debug)]
pub struct RateCache {
    ttl: Duration,
    state: RwLock<Option<RateSnapshot>>,
}

impl RateCache {
    /// Creates an empty cache whose entries stay fresh for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(None),
        }
    }

    /// Returns the configured TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached snapshot if it is still fresh at `now`.
    pub async fn get_fresh(&self, now: Instant) -> Option<RateSnapshot> {
        let cached = *self.state.read().await;
        cached.filter(|snapshot| snapshot.is_fresh(now, self.ttl))
    }

    /// Returns the cached snapshot regardless of age.
    pub async fn latest(&self) -> Option<RateSnapshot> {
        *self.state.read().await
    }

    /// Replaces the cached snapshot.
    pub async fn store(&self, snapshot: RateSnapshot) {
        *self.state.write().await = Some(snapshot);
    }

    /// Empties the cache.
    pub async fn clear(&self) {
        *self.state.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(at: Instant) -> RateSnapshot {
        RateSnapshot {
            rates: RateTable::new(100.0, 2.0, 3000.0),
            source: RateSource::Live,
            fetched_at: at,
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_is_served() {
        let cache = RateCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(cache.get_fresh(t0).await.is_none());

        cache.store(snapshot(t0)).await;
        let hit = cache.get_fresh(t0 + Duration::from_secs(59)).await;
        assert_eq!(hit, Some(snapshot(t0)));
    }

    #[tokio::test]
    async fn test_expired_entry_is_kept_but_not_fresh() {
        let cache = RateCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.store(snapshot(t0)).await;

        let later = t0 + Duration::from_secs(60);
        assert!(cache.get_fresh(later).await.is_none());
        assert_eq!(cache.latest().await, Some(snapshot(t0)));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = RateCache::new(Duration::from_secs(60));
        cache.store(snapshot(Instant::now())).await;
        cache.clear().await;
        assert!(cache.latest().await.is_none());
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(FallbackReason::Timeout.to_string(), "timeout");
        assert!(!RateSource::Fallback {
            reason: FallbackReason::FetchFailed
        }
        .is_live());
    }
}
