//! Revenue allocation.
//!
//! Collected fees are split into three fixed buckets: 30% burned, 40% to
//! development and 30% to operations.

use serde::{Deserialize, Serialize};

/// Share of fee revenue that is burned.
pub const BURN_SHARE: f64 = 0.30;

/// Share of fee revenue funding development.
pub const DEVELOPMENT_SHARE: f64 = 0.40;

/// Share of fee revenue funding operations.
pub const OPERATIONS_SHARE: f64 = 0.30;

/// Fee revenue split into buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueAllocation {
    /// Amount to burn.
    pub burn: f64,
    /// Amount for development.
    pub development: f64,
    /// Amount for operations.
    pub operations: f64,
}

impl RevenueAllocation {
    /// Sum of all buckets.
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.burn + self.development + self.operations
    }
}

/// Splits `fee_amount` into burn / development / operations buckets.
///
/// The input is not validated: a negative amount yields negative buckets.
#[must_use]
pub fn allocate(fee_amount: f64) -> RevenueAllocation {
    RevenueAllocation {
        burn: fee_amount * BURN_SHARE,
        development: fee_amount * DEVELOPMENT_SHARE,
        operations: fee_amount * OPERATIONS_SHARE,
    }
}
