//! Cached access to live asset prices.
//!
//! [`RateProvider`] sits between callers and a [`PriceFeed`]:
//!
//! - A fresh cached table (younger than the TTL, 60 s by default) is served
//!   without touching the feed.
//! - Otherwise the feed is queried with a bounded timeout. A successful
//!   answer becomes the new cached table.
//! - Any failure (transport, status, payload, timeout, or no feed at all)
//!   yields the fallback table built from configuration. The fallback is
//!   cached too, so a failing feed is not hammered within the TTL window.
//!
//! Rate lookups never fail. [`RateProvider::get_snapshot`] exposes whether
//! the table is live or a fallback for callers that want to surface
//! degraded operation.
//!
//! Concurrent refreshes are not coalesced: two callers racing past an
//! expired entry both query the feed and the last write wins. Each refresh
//! runs on its own task, so it still completes and warms the cache when
//! the caller that started it goes away.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{FallbackReason, RateCache, RateSnapshot, RateSource};
use crate::clock::{Clock, SystemClock};
use crate::feed::{FeedError, FeedQuote, PriceFeed};
use crate::fees::{self, FeeBreakdown};
use crate::rates::RateTable;
use crate::unit::Unit;

/// Tuning knobs for a [`RateProvider`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateProviderConfig {
    /// How long a fetched table is served from cache.
    pub cache_ttl: Duration,
    /// Upper bound on a single feed lookup.
    pub fetch_timeout: Duration,
    /// MYXN price used when the feed has no MYXN quote.
    pub myxn_fallback_price: Option<f64>,
}

impl RateProviderConfig {
    /// Default cache TTL (60 seconds).
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

    /// Default feed timeout (5 seconds).
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

    /// Sets the cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the feed timeout.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the MYXN fallback price.
    #[must_use]
    pub const fn with_myxn_fallback_price(mut self, price: f64) -> Self {
        self.myxn_fallback_price = Some(price);
        self
    }
}

impl Default for RateProviderConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Self::DEFAULT_CACHE_TTL,
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
            myxn_fallback_price: None,
        }
    }
}

/// Serves [`RateTable`]s from a price feed through a TTL cache.
///
/// Clones share the same cache.
#[derive(Clone)]
pub struct RateProvider {
    feed: Arc<dyn PriceFeed>,
    clock: Arc<dyn Clock>,
    config: RateProviderConfig,
    cache: Arc<RateCache>,
}

impl std::fmt::Debug for RateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateProvider")
            .field("feed", &"<PriceFeed>")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}

impl RateProvider {
    /// Creates a provider with the default configuration and the system clock.
    #[must_use]
    pub fn new(feed: impl PriceFeed + 'static) -> Self {
        Self::with_config(feed, RateProviderConfig::default())
    }

    /// Creates a provider with a custom configuration.
    #[must_use]
    pub fn with_config(feed: impl PriceFeed + 'static, config: RateProviderConfig) -> Self {
        Self {
            feed: Arc::new(feed),
            clock: Arc::new(SystemClock),
            cache: Arc::new(RateCache::new(config.cache_ttl)),
            config,
        }
    }

    /// Replaces the clock used for cache expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RateProviderConfig {
        &self.config
    }

    /// Returns the most recent snapshot, fresh or not, without fetching.
    pub async fn cached(&self) -> Option<RateSnapshot> {
        self.cache.latest().await
    }

    /// Returns the current rate table.
    ///
    /// Serves the cached table while it is fresh unless `force_refresh` is
    /// set. Never fails: an unavailable feed yields the fallback table.
    pub async fn get_rates(&self, force_refresh: bool) -> RateTable {
        self.get_snapshot(force_refresh).await.rates
    }

    /// Like [`Self::get_rates`], but also reports where the table came from.
    pub async fn get_snapshot(&self, force_refresh: bool) -> RateSnapshot {
        if !force_refresh {
            if let Some(snapshot) = self.cache.get_fresh(self.clock.now()).await {
                #[cfg(feature = "telemetry")]
                tracing::debug!(source = ?snapshot.source, "xenfee.rates.cache_hit");
                return snapshot;
            }
        }

        #[cfg(feature = "telemetry")]
        tracing::debug!(force_refresh, "xenfee.rates.cache_miss");

        let provider = self.clone();
        match tokio::spawn(async move { provider.refresh().await }).await {
            Ok(snapshot) => snapshot,
            Err(_join_error) => {
                #[cfg(feature = "telemetry")]
                tracing::error!(error = %_join_error, "Rate refresh task failed");
                let snapshot = self.fallback_snapshot(FallbackReason::FetchFailed);
                self.cache.store(snapshot).await;
                snapshot
            }
        }
    }

    /// Queries the feed and stores the outcome in the cache.
    async fn refresh(&self) -> RateSnapshot {
        let outcome = tokio::time::timeout(self.config.fetch_timeout, self.feed.fetch()).await;

        let snapshot = match outcome {
            Ok(Ok(quote)) => RateSnapshot {
                rates: self.live_table(quote),
                source: RateSource::Live,
                fetched_at: self.clock.now(),
            },
            Ok(Err(FeedError::NotConfigured)) => {
                #[cfg(feature = "telemetry")]
                tracing::debug!("No price feed configured, serving fallback rates");
                self.fallback_snapshot(FallbackReason::NotConfigured)
            }
            Ok(Err(_error)) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(error = %_error, "Price feed failed, serving fallback rates");
                self.fallback_snapshot(FallbackReason::FetchFailed)
            }
            Err(_elapsed) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(
                    timeout = ?self.config.fetch_timeout,
                    "Price feed timed out, serving fallback rates"
                );
                self.fallback_snapshot(FallbackReason::Timeout)
            }
        };

        self.cache.store(snapshot).await;
        snapshot
    }

    fn live_table(&self, quote: FeedQuote) -> RateTable {
        let myxn = quote
            .myxn
            .or(self.config.myxn_fallback_price)
            .unwrap_or(0.0);
        RateTable::new(quote.sol.unwrap_or(0.0), myxn, quote.eth.unwrap_or(0.0))
    }

    fn fallback_snapshot(&self, reason: FallbackReason) -> RateSnapshot {
        RateSnapshot {
            rates: RateTable::fallback(self.config.myxn_fallback_price),
            source: RateSource::Fallback { reason },
            fetched_at: self.clock.now(),
        }
    }

    /// Computes fees for `amount` of `unit` at the current rates.
    pub async fn calculate_fees(&self, amount: f64, unit: Unit) -> FeeBreakdown {
        let rates = self.get_rates(false).await;
        fees::compute_fees(amount, unit, &rates)
    }

    /// Platform fee for `amount` of `unit`, in `unit`.
    pub async fn platform_fee(&self, amount: f64, unit: Unit) -> f64 {
        self.calculate_fees(amount, unit).await.platform_fee
    }

    /// Transaction fee for `amount` of `unit`, in `unit`.
    pub async fn transaction_fee(&self, amount: f64, unit: Unit) -> f64 {
        self.calculate_fees(amount, unit).await.transaction_fee
    }

    /// Amount left after fees, in `unit`, never below zero.
    pub async fn net_amount(&self, amount: f64, unit: Unit) -> f64 {
        let rates = self.get_rates(false).await;
        fees::net_amount(amount, unit, &rates)
    }
}
