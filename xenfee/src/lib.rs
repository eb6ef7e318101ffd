#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Fee schedule, currency conversion and revenue allocation for `MyXenPay`.
//!
//! Every payment through the platform carries a 0.07% fee (0.01% platform,
//! 0.06% transaction). Fees are computed on the USD value of a payment, so
//! amounts in volatile assets are converted through a [`RateTable`] that a
//! [`RateProvider`] keeps fresh from a market data feed. Collected fees are
//! then split 30/40/30 into burn, development and operations buckets.
//!
//! # Modules
//!
//! - [`unit`] - The closed set of currency units
//! - [`rates`] - USD price table
//! - [`fees`] - Fee schedule, conversions and fee breakdowns
//! - [`revenue`] - Revenue allocation buckets
//! - [`feed`] - Market data source trait
//! - [`cache`] - Time-bounded rate cache with provenance
//! - [`clock`] - Injectable time source
//! - [`provider`] - Cached rate lookups with fallback
//! - [`amount`] - Human-readable amount parsing
//! - [`payment_link`] - Solana Pay and EIP-681 payment links
//!
//! # Example
//!
//! ```rust
//! use xenfee::{RateTable, Unit, allocate, compute_fees};
//!
//! let rates = RateTable::new(100.0, 2.0, 3000.0);
//! let fees = compute_fees(1000.0, Unit::Usd, &rates);
//! assert!((fees.usd.total_fee - 0.7).abs() < 1e-9);
//!
//! let buckets = allocate(fees.usd.total_fee);
//! assert!((buckets.total() - 0.7).abs() < 1e-9);
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - Logs cache and fallback events through `tracing`

pub mod amount;
pub mod cache;
pub mod clock;
pub mod feed;
pub mod fees;
pub mod payment_link;
pub mod provider;
pub mod rates;
pub mod revenue;
pub mod unit;

pub use cache::{FallbackReason, RateSnapshot, RateSource};
pub use feed::{FeedError, FeedQuote, PriceFeed};
pub use fees::{
    FEE_SCHEDULE, FeeAmounts, FeeBreakdown, FeeSchedule, compute_fees, from_reference,
    to_reference,
};
pub use provider::{RateProvider, RateProviderConfig};
pub use rates::RateTable;
pub use revenue::{RevenueAllocation, allocate};
pub use unit::Unit;
