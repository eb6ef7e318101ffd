//! USD prices for every supported [`Unit`].

use serde::{Deserialize, Serialize};

use crate::unit::Unit;

/// Price of each unit, expressed in USD per one unit.
///
/// The reference fiat and the stable-pegged unit are always priced at
/// exactly 1. Volatile prices are finite and non-negative: anything else is
/// stored as 0, which downstream conversions read as "no price available".
///
/// Tables are values. Updating a price produces a new table
/// ([`RateTable::with_price`]) and caches replace tables wholesale.
///
/// Serialized as a map keyed by ticker:
///
/// ```json
/// { "USD": 1.0, "USDC": 1.0, "SOL": 100.0, "MYXN": 2.0, "ETH": 3000.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRateTable", rename_all = "UPPERCASE")]
pub struct RateTable {
    usd: f64,
    usdc: f64,
    sol: f64,
    myxn: f64,
    eth: f64,
}

/// Wire shape accepted on deserialization. The pegged entries are ignored so
/// a decoded table always upholds the parity invariant.
#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct RawRateTable {
    #[serde(default)]
    sol: f64,
    #[serde(default)]
    myxn: f64,
    #[serde(default)]
    eth: f64,
}

impl From<RawRateTable> for RateTable {
    fn from(raw: RawRateTable) -> Self {
        Self::new(raw.sol, raw.myxn, raw.eth)
    }
}

fn sanitize(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
        price
    } else {
        0.0
    }
}

impl RateTable {
    /// Builds a table from volatile asset prices. Pegged units are set to 1.
    #[must_use]
    pub fn new(sol: f64, myxn: f64, eth: f64) -> Self {
        Self {
            usd: 1.0,
            usdc: 1.0,
            sol: sanitize(sol),
            myxn: sanitize(myxn),
            eth: sanitize(eth),
        }
    }

    /// The table served when no live prices are available.
    ///
    /// Every volatile asset is unpriced except MYXN, which takes the
    /// configured override when one is set.
    #[must_use]
    pub fn fallback(myxn_override: Option<f64>) -> Self {
        Self::new(0.0, myxn_override.unwrap_or(0.0), 0.0)
    }

    /// Returns the USD price of one `unit`.
    #[must_use]
    pub const fn price(&self, unit: Unit) -> f64 {
        match unit {
            Unit::Usd => self.usd,
            Unit::Usdc => self.usdc,
            Unit::Sol => self.sol,
            Unit::Myxn => self.myxn,
            Unit::Eth => self.eth,
        }
    }

    /// Returns `false` when `unit` has no usable price.
    ///
    /// Fee estimates for an unpriced unit come out as zero and should be
    /// shown as unavailable rather than free.
    #[must_use]
    pub fn is_priced(&self, unit: Unit) -> bool {
        unit.is_pegged() || self.price(unit) > 0.0
    }

    /// Returns a copy of this table with `unit` repriced.
    ///
    /// Pegged units keep their parity price.
    #[must_use]
    pub fn with_price(mut self, unit: Unit, price: f64) -> Self {
        let price = sanitize(price);
        match unit {
            Unit::Usd | Unit::Usdc => {}
            Unit::Sol => self.sol = price,
            Unit::Myxn => self.myxn = price,
            Unit::Eth => self.eth = price,
        }
        self
    }

    /// Iterates over `(unit, price)` pairs in [`Unit::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Unit, f64)> + '_ {
        Unit::ALL.into_iter().map(|unit| (unit, self.price(unit)))
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::fallback(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pegged_units_are_always_one() {
        let table = RateTable::new(100.0, 2.0, 3000.0);
        assert_eq!(table.price(Unit::Usd), 1.0);
        assert_eq!(table.price(Unit::Usdc), 1.0);
        let table = table.with_price(Unit::Usd, 7.0).with_price(Unit::Usdc, 0.0);
        assert_eq!(table.price(Unit::Usd), 1.0);
        assert_eq!(table.price(Unit::Usdc), 1.0);
    }

    #[test]
    fn test_invalid_prices_are_stored_as_zero() {
        let table = RateTable::new(f64::NAN, -2.0, f64::INFINITY);
        for unit in Unit::VOLATILE {
            assert_eq!(table.price(unit), 0.0);
            assert!(!table.is_priced(unit));
        }
        assert!(table.is_priced(Unit::Usdc));
    }

    #[test]
    fn test_fallback_table() {
        let table = RateTable::fallback(None);
        assert_eq!(table, RateTable::new(0.0, 0.0, 0.0));

        let table = RateTable::fallback(Some(0.25));
        assert_eq!(table.price(Unit::Myxn), 0.25);
        assert_eq!(table.price(Unit::Sol), 0.0);
        assert_eq!(table.price(Unit::Eth), 0.0);
    }

    #[test]
    fn test_with_price_leaves_original_untouched() {
        let original = RateTable::new(100.0, 2.0, 3000.0);
        let updated = original.with_price(Unit::Sol, 150.0);
        assert_eq!(original.price(Unit::Sol), 100.0);
        assert_eq!(updated.price(Unit::Sol), 150.0);
    }

    #[test]
    fn test_serialize_as_ticker_map() {
        let table = RateTable::new(100.0, 2.0, 3000.0);
        let json = serde_json::to_value(table).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"USD": 1.0, "USDC": 1.0, "SOL": 100.0, "MYXN": 2.0, "ETH": 3000.0})
        );
    }

    #[test]
    fn test_deserialize_restores_parity() {
        let table: RateTable =
            serde_json::from_str(r#"{"USD": 3.0, "USDC": 0.5, "SOL": 100.0, "ETH": -1.0}"#)
                .unwrap();
        assert_eq!(table.price(Unit::Usd), 1.0);
        assert_eq!(table.price(Unit::Usdc), 1.0);
        assert_eq!(table.price(Unit::Sol), 100.0);
        assert_eq!(table.price(Unit::Myxn), 0.0);
        assert_eq!(table.price(Unit::Eth), 0.0);
    }
}
