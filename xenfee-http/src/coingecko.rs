//! A [`PriceFeed`] backed by the CoinGecko `simple/price` endpoint.
//!
//! SOL and ETH are fetched in one request. When a CoinGecko id for MYXN is
//! configured, a second request fetches it; that request is allowed to fail
//! on its own, in which case the quote simply carries no MYXN price and the
//! provider falls back to the configured MYXN price.
//!
//! ## Error Handling
//!
//! [`CoinGeckoError`] records which step failed:
//! - URL construction
//! - HTTP transport failures (including request timeouts)
//! - JSON deserialization errors
//! - Unexpected HTTP status responses
//!
//! It converts into [`FeedError`] for the provider.

use std::collections::HashMap;
use std::time::Duration;

use http::{HeaderMap, StatusCode};
use reqwest::Client;
use serde::Deserialize;
use url::Url;
use xenfee::feed::BoxFuture;
use xenfee::{FeedError, FeedQuote, PriceFeed};

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// CoinGecko id for SOL.
pub const SOLANA_ID: &str = "solana";

/// CoinGecko id for ETH.
pub const ETHEREUM_ID: &str = "ethereum";

/// Public CoinGecko API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3/";

/// One entry of a `simple/price` response.
#[derive(Debug, Deserialize)]
struct CoinPrice {
    usd: Option<f64>,
}

type SimplePriceResponse = HashMap<String, CoinPrice>;

fn usd_price(prices: &SimplePriceResponse, id: &str) -> Option<f64> {
    prices.get(id).and_then(|price| price.usd)
}

/// Errors that can occur while querying CoinGecko.
#[derive(Debug, thiserror::Error)]
pub enum CoinGeckoError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// Failed to read response body.
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl From<CoinGeckoError> for FeedError {
    fn from(err: CoinGeckoError) -> Self {
        match err {
            CoinGeckoError::HttpStatus { status, body, .. } => Self::Status { status, body },
            CoinGeckoError::JsonDeserialization { .. } => Self::Malformed(err.to_string()),
            CoinGeckoError::UrlParse { .. }
            | CoinGeckoError::Http { .. }
            | CoinGeckoError::ResponseBodyRead { .. } => Self::Transport(err.to_string()),
        }
    }
}

/// Price feed querying CoinGecko over HTTP.
#[derive(Clone, Debug)]
pub struct CoinGeckoFeed {
    /// Base URL of the API (e.g. `https://api.coingecko.com/api/v3/`)
    base_url: Url,
    /// Full URL of `GET /simple/price`
    price_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Optional custom headers sent with each request (e.g. API keys)
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
    /// CoinGecko id of the MYXN token, if listed
    myxn_id: Option<String>,
}

impl CoinGeckoFeed {
    /// Returns the base URL used by this feed.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the computed `./simple/price` URL.
    #[must_use]
    pub const fn price_url(&self) -> &Url {
        &self.price_url
    }

    /// Returns the configured MYXN CoinGecko id, if any.
    #[must_use]
    pub fn myxn_id(&self) -> Option<&str> {
        self.myxn_id.as_deref()
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Constructs a feed from a base URL ending in `/`.
    ///
    /// # Errors
    ///
    /// Returns [`CoinGeckoError`] if the endpoint URL cannot be built.
    pub fn try_new(base_url: Url) -> Result<Self, CoinGeckoError> {
        let price_url =
            base_url
                .join("./simple/price")
                .map_err(|e| CoinGeckoError::UrlParse {
                    context: "Failed to construct ./simple/price URL",
                    source: e,
                })?;
        Ok(Self {
            base_url,
            price_url,
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: None,
            myxn_id: None,
        })
    }

    /// Also fetch MYXN under the given CoinGecko id.
    ///
    /// Blank ids are ignored.
    #[must_use]
    pub fn with_myxn_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.myxn_id = (!id.trim().is_empty()).then(|| id.trim().to_owned());
        self
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fetches the current quote.
    ///
    /// # Errors
    ///
    /// Returns [`CoinGeckoError`] if the SOL/ETH request fails. A failing
    /// MYXN request only drops the MYXN price from the quote.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "xenfee.coingecko.quote", skip_all, err)
    )]
    pub async fn quote(&self) -> Result<FeedQuote, CoinGeckoError> {
        let prices = self
            .simple_price(&[SOLANA_ID, ETHEREUM_ID], "GET /simple/price")
            .await?;

        let myxn = match &self.myxn_id {
            Some(id) => match self.simple_price(&[id.as_str()], "GET /simple/price (MYXN)").await {
                Ok(myxn_prices) => usd_price(&myxn_prices, id),
                Err(_err) => {
                    #[cfg(feature = "telemetry")]
                    tracing::warn!(error = %_err, myxn_id = %id, "MYXN price lookup failed");
                    None
                }
            },
            None => None,
        };

        Ok(FeedQuote {
            sol: usd_price(&prices, SOLANA_ID),
            eth: usd_price(&prices, ETHEREUM_ID),
            myxn,
        })
    }

    /// Sends `GET /simple/price?ids=..&vs_currencies=usd`.
    ///
    /// `context` names the request in errors and traces.
    async fn simple_price(
        &self,
        ids: &[&str],
        context: &'static str,
    ) -> Result<SimplePriceResponse, CoinGeckoError> {
        let mut url = self.price_url.clone();
        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("vs_currencies", "usd");

        let mut req = self.client.get(url);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| CoinGeckoError::Http { context, source: e })?;

        if http_response.status() == StatusCode::OK {
            http_response
                .json::<SimplePriceResponse>()
                .await
                .map_err(|e| CoinGeckoError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| CoinGeckoError::ResponseBodyRead { context, source: e })?;
            Err(CoinGeckoError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

impl PriceFeed for CoinGeckoFeed {
    fn fetch(&self) -> BoxFuture<'_, Result<FeedQuote, FeedError>> {
        Box::pin(async move { self.quote().await.map_err(FeedError::from) })
    }
}

/// Parses a base URL, normalizing it to a single trailing slash.
impl TryFrom<&str> for CoinGeckoFeed {
    type Error = CoinGeckoError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| CoinGeckoError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        Self::try_new(url)
    }
}

impl TryFrom<String> for CoinGeckoFeed {
    type Error = CoinGeckoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}
