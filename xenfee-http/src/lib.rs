//! HTTP market data feeds for the [`xenfee`] rate provider.
//!
//! # Modules
//!
//! - [`coingecko`] — USD prices from the CoinGecko simple price API
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for feed requests

pub mod coingecko;

pub use coingecko::{CoinGeckoError, CoinGeckoFeed};
