//! CLI configuration.
//!
//! Loads configuration from an optional TOML file with support for
//! environment variable expansion in values. Variables use `$VAR` or
//! `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! coingecko_url = "https://api.coingecko.com/api/v3/"
//! myxn_coingecko_id = "$CG_ID_MYXN"
//! myxn_price_usd = 0.042
//! cache_ttl_secs = 60
//! fetch_timeout_secs = 5
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `xenfee.toml`)
//! - `COINGECKO_URL` — Override the CoinGecko API base URL
//! - `CG_ID_MYXN` — CoinGecko id of the MYXN token
//! - `MYXN_PRICE_USD` — MYXN price used when no live price is available

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xenfee::RateProviderConfig;
use xenfee::feed::NoFeed;
use xenfee::provider::RateProvider;
use xenfee_http::CoinGeckoFeed;
use xenfee_http::coingecko::{CoinGeckoError, DEFAULT_BASE_URL};

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "xenfee.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for [`XenfeeConfig`].
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// Path of the file.
        path: String,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XenfeeConfig {
    /// CoinGecko API base URL.
    #[serde(default = "default_coingecko_url")]
    pub coingecko_url: String,

    /// CoinGecko id of the MYXN token. MYXN is not fetched live when unset.
    #[serde(default)]
    pub myxn_coingecko_id: Option<String>,

    /// MYXN price used when the feed has no MYXN quote.
    #[serde(default)]
    pub myxn_price_usd: Option<f64>,

    /// Rate cache TTL in seconds (default: `60`).
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Feed request timeout in seconds (default: `5`).
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Skip the live feed and always use fallback rates.
    #[serde(default)]
    pub offline: bool,
}

fn default_coingecko_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

const fn default_cache_ttl_secs() -> u64 {
    60
}

const fn default_fetch_timeout_secs() -> u64 {
    5
}

impl Default for XenfeeConfig {
    fn default() -> Self {
        Self {
            coingecko_url: default_coingecko_url(),
            myxn_coingecko_id: None,
            myxn_price_usd: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            offline: false,
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl XenfeeConfig {
    /// Loads configuration from `path`, or from the `CONFIG` environment
    /// variable, falling back to `xenfee.toml` in the current directory.
    ///
    /// A missing file is not an error: defaults and environment overrides
    /// apply on their own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let path = path
            .map(str::to_owned)
            .or_else(|| env_lookup("CONFIG"))
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
        let content = if Path::new(&path).exists() {
            std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?
        } else {
            String::new()
        };
        Self::from_toml(&content, &path, env_lookup)
    }

    /// Parses TOML `content`, expanding variables and applying overrides
    /// through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the expanded content is invalid.
    pub fn from_toml(
        content: &str,
        path: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let expanded = expand_vars(content, &lookup);
        let mut config: Self = toml::from_str(&expanded).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.apply_overrides(&lookup);
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("COINGECKO_URL").filter(|url| !url.trim().is_empty()) {
            self.coingecko_url = url;
        }
        if let Some(id) = lookup("CG_ID_MYXN").filter(|id| !id.trim().is_empty()) {
            self.myxn_coingecko_id = Some(id);
        }
        // Unusable values are ignored, leaving the file setting in place.
        if let Some(price) = lookup("MYXN_PRICE_USD")
            .and_then(|price| price.trim().parse::<f64>().ok())
            .filter(|price| price.is_finite() && *price > 0.0)
        {
            self.myxn_price_usd = Some(price);
        }
        // Unexpanded `$VAR` references mean the variable was never set.
        if self
            .myxn_coingecko_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty() || id.starts_with('$'))
        {
            self.myxn_coingecko_id = None;
        }
    }

    /// Rate provider settings derived from this configuration.
    #[must_use]
    pub fn provider_config(&self) -> RateProviderConfig {
        RateProviderConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            myxn_fallback_price: self.myxn_price_usd,
        }
    }

    /// Builds the rate provider described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoinGeckoError`] if `coingecko_url` is not a valid URL.
    pub fn rate_provider(&self) -> Result<RateProvider, CoinGeckoError> {
        let config = self.provider_config();
        if self.offline {
            return Ok(RateProvider::with_config(NoFeed, config));
        }
        let mut feed = CoinGeckoFeed::try_from(self.coingecko_url.as_str())?
            .with_timeout(config.fetch_timeout);
        if let Some(id) = &self.myxn_coingecko_id {
            feed = feed.with_myxn_id(id.as_str());
        }
        Ok(RateProvider::with_config(feed, config))
    }
}

/// Expands `$VAR` and `${VAR}` patterns in `input` using `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_vars(input: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match lookup(&name).filter(|_| !name.is_empty()) {
            Some(value) => result.push_str(&value),
            None if braced => {
                result.push_str("${");
                result.push_str(&name);
                if !name.is_empty() {
                    result.push('}');
                }
            }
            None => {
                result.push('$');
                result.push_str(&name);
            }
        }
    }

    result
}
