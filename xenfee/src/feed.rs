//! Market data sources for the [`RateProvider`](crate::provider::RateProvider).
//!
//! A [`PriceFeed`] reports USD prices for the volatile assets. The provider
//! owns caching, timeouts and fallback, so feeds only need to perform a
//! single lookup and describe how it went.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// USD prices reported by a feed. `None` means the feed had no quote.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeedQuote {
    /// USD per SOL.
    pub sol: Option<f64>,
    /// USD per ETH.
    pub eth: Option<f64>,
    /// USD per MYXN.
    pub myxn: Option<f64>,
}

/// Why a feed lookup failed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// No live source is configured.
    #[error("price feed not configured")]
    NotConfigured,
    /// The request never produced a response.
    #[error("price feed transport error: {0}")]
    Transport(String),
    /// The source answered with a non-success status.
    #[error("price feed returned HTTP {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, as text.
        body: String,
    },
    /// The response could not be decoded.
    #[error("malformed price feed response: {0}")]
    Malformed(String),
}

impl FeedError {
    /// Wraps an arbitrary feed implementation error as a transport failure.
    #[must_use]
    pub fn other(err: impl std::error::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A source of live asset prices.
///
/// Implementations are shared across tasks, hence the `Send + Sync` bound
/// and the boxed future.
pub trait PriceFeed: Send + Sync {
    /// Fetches the current USD prices.
    fn fetch(&self) -> BoxFuture<'_, Result<FeedQuote, FeedError>>;
}

impl<T: PriceFeed + ?Sized> PriceFeed for Arc<T> {
    fn fetch(&self) -> BoxFuture<'_, Result<FeedQuote, FeedError>> {
        (**self).fetch()
    }
}

/// A feed used when no market data source is configured.
///
/// Every lookup fails with [`FeedError::NotConfigured`], so the provider
/// always serves its fallback table.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeed;

impl PriceFeed for NoFeed {
    fn fetch(&self) -> BoxFuture<'_, Result<FeedQuote, FeedError>> {
        Box::pin(async { Err(FeedError::NotConfigured) })
    }
}

/// A feed that always answers with the same quote.
///
/// Useful for demos and for pinning prices in tests of downstream code.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFeed(pub FeedQuote);

impl PriceFeed for StaticFeed {
    fn fetch(&self) -> BoxFuture<'_, Result<FeedQuote, FeedError>> {
        let quote = self.0;
        Box::pin(async move { Ok(quote) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_feed_is_not_configured() {
        let err = NoFeed.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::NotConfigured));
    }

    #[tokio::test]
    async fn test_static_feed_through_arc() {
        let quote = FeedQuote {
            sol: Some(100.0),
            eth: None,
            myxn: Some(2.0),
        };
        let feed: Arc<dyn PriceFeed> = Arc::new(StaticFeed(quote));
        assert_eq!(feed.fetch().await.unwrap(), quote);
    }

    #[test]
    fn test_other_wraps_as_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = FeedError::other(io);
        assert!(matches!(&err, FeedError::Transport(msg) if msg == "reset by peer"));
    }

    #[test]
    fn test_status_error_display() {
        let err = FeedError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "rate limited".into(),
        };
        assert_eq!(
            err.to_string(),
            "price feed returned HTTP 429 Too Many Requests: rate limited"
        );
    }
}
