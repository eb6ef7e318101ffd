//! Fee schedule and currency conversion.
//!
//! Every payment pays a 0.07% fee, made of a 0.01% platform fee and a 0.06%
//! transaction fee. Fees are computed on the USD value of the payment and
//! converted back into the payment unit for display.
//!
//! All functions here are pure. Invalid amounts (non-finite, zero or
//! negative) and unpriced units yield zero instead of an error, so a fee
//! estimate is always available.

use serde::{Deserialize, Serialize};

use crate::rates::RateTable;
use crate::unit::Unit;

/// Fractional fee rates charged on every payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    /// Platform fee rate.
    pub platform: f64,
    /// Transaction fee rate.
    pub transaction: f64,
}

impl FeeSchedule {
    /// Combined fee rate.
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.platform + self.transaction
    }
}

/// Platform fee rate (0.01%).
pub const PLATFORM_FEE_RATE: f64 = 0.0001;

/// Transaction fee rate (0.06%).
pub const TRANSACTION_FEE_RATE: f64 = 0.0006;

/// Total fee rate (0.07%).
pub const TOTAL_FEE_RATE: f64 = PLATFORM_FEE_RATE + TRANSACTION_FEE_RATE;

/// The process-wide fee schedule.
pub const FEE_SCHEDULE: FeeSchedule = FeeSchedule {
    platform: PLATFORM_FEE_RATE,
    transaction: TRANSACTION_FEE_RATE,
};

/// A platform / transaction / total fee triple in a single unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeAmounts {
    /// Platform share of the fee.
    pub platform_fee: f64,
    /// Transaction share of the fee.
    pub transaction_fee: f64,
    /// Sum of the platform and transaction fees.
    pub total_fee: f64,
}

/// Fees for one payment, in the payment unit and in USD.
///
/// ```json
/// {
///   "platformFee": 0.001, "transactionFee": 0.006, "totalFee": 0.007,
///   "unit": "SOL",
///   "usd": { "platformFee": 0.1, "transactionFee": 0.6, "totalFee": 0.7 }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    /// Platform fee in `unit`.
    pub platform_fee: f64,
    /// Transaction fee in `unit`.
    pub transaction_fee: f64,
    /// Total fee in `unit`.
    pub total_fee: f64,
    /// Unit of the payment the fees were computed for.
    pub unit: Unit,
    /// The same fees in USD.
    pub usd: FeeAmounts,
}

impl FeeBreakdown {
    /// Returns the unit-denominated triple.
    #[must_use]
    pub const fn in_unit(&self) -> FeeAmounts {
        FeeAmounts {
            platform_fee: self.platform_fee,
            transaction_fee: self.transaction_fee,
            total_fee: self.total_fee,
        }
    }
}

fn valid_amount(amount: f64) -> Option<f64> {
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Converts `amount` of `unit` into USD.
///
/// Pegged units convert 1:1. Returns 0 for invalid amounts and for units
/// without a positive rate.
#[must_use]
pub fn to_reference(amount: f64, unit: Unit, rates: &RateTable) -> f64 {
    let Some(amount) = valid_amount(amount) else {
        return 0.0;
    };
    if unit.is_pegged() {
        return amount;
    }
    let price = rates.price(unit);
    if price > 0.0 { amount * price } else { 0.0 }
}

/// Converts a USD `amount` into `unit`.
///
/// Inverse of [`to_reference`], with the same zero conventions.
#[must_use]
pub fn from_reference(amount: f64, unit: Unit, rates: &RateTable) -> f64 {
    let Some(amount) = valid_amount(amount) else {
        return 0.0;
    };
    if unit.is_pegged() {
        return amount;
    }
    let price = rates.price(unit);
    if price > 0.0 { amount / price } else { 0.0 }
}

/// Computes the fee breakdown for a payment of `amount` in `unit`.
#[must_use]
pub fn compute_fees(amount: f64, unit: Unit, rates: &RateTable) -> FeeBreakdown {
    let usd_amount = to_reference(amount, unit, rates);
    let usd_platform = usd_amount * FEE_SCHEDULE.platform;
    let usd_transaction = usd_amount * FEE_SCHEDULE.transaction;
    let usd_total = usd_platform + usd_transaction;

    FeeBreakdown {
        platform_fee: from_reference(usd_platform, unit, rates),
        transaction_fee: from_reference(usd_transaction, unit, rates),
        total_fee: from_reference(usd_total, unit, rates),
        unit,
        usd: FeeAmounts {
            platform_fee: usd_platform,
            transaction_fee: usd_transaction,
            total_fee: usd_total,
        },
    }
}

/// What the recipient keeps after fees, never below zero.
#[must_use]
pub fn net_amount(amount: f64, unit: Unit, rates: &RateTable) -> f64 {
    let Some(amount) = valid_amount(amount) else {
        return 0.0;
    };
    let fees = compute_fees(amount, unit, rates);
    (amount - fees.total_fee).max(0.0)
}

/// What the payer is charged: the amount plus the total fee.
#[must_use]
pub fn gross_amount(amount: f64, unit: Unit, rates: &RateTable) -> f64 {
    let Some(amount) = valid_amount(amount) else {
        return 0.0;
    };
    amount + compute_fees(amount, unit, rates).total_fee
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn rates() -> RateTable {
        RateTable::new(100.0, 2.0, 3000.0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= EPS * b.abs().max(1.0)
    }

    #[test]
    fn test_schedule_total_is_const() {
        const TOTAL: f64 = FEE_SCHEDULE.total();
        assert!(close(TOTAL, TOTAL_FEE_RATE));
        assert!(close(TOTAL, 0.0007));
    }

    #[test]
    fn test_schedule_constants() {
        assert!(close(FEE_SCHEDULE.platform, 0.0001));
        assert!(close(FEE_SCHEDULE.transaction, 0.0006));
        assert!(close(FEE_SCHEDULE.total(), 0.0007));
        assert!(close(TOTAL_FEE_RATE, 0.0007));
    }

    #[test]
    fn test_usd_fee_split_for_1000() {
        let fees = compute_fees(1000.0, Unit::Usd, &rates());
        assert!(close(fees.usd.platform_fee, 0.1));
        assert!(close(fees.usd.transaction_fee, 0.6));
        assert!(close(fees.usd.total_fee, 0.7));
        assert_eq!(fees.in_unit(), fees.usd);
        assert_eq!(fees.unit, Unit::Usd);
    }

    #[test]
    fn test_usd_total_fee_is_amount_times_total_rate() {
        for amount in [0.01, 1.0, 3.5, 99.99, 1000.0, 123_456.789, 1e9] {
            let fees = compute_fees(amount, Unit::Usd, &rates());
            assert!(close(fees.usd.total_fee, amount * 0.0007), "{amount}");
        }
    }

    #[test]
    fn test_parts_sum_to_total() {
        for unit in Unit::ALL {
            for amount in [0.5, 1.0, 42.0, 10_000.0] {
                let fees = compute_fees(amount, unit, &rates());
                assert!(close(
                    fees.platform_fee + fees.transaction_fee,
                    fees.total_fee
                ));
                assert!(close(
                    fees.usd.platform_fee + fees.usd.transaction_fee,
                    fees.usd.total_fee
                ));
            }
        }
    }

    #[test]
    fn test_sol_conversion() {
        assert!(close(to_reference(1.0, Unit::Sol, &rates()), 100.0));
        assert!(close(from_reference(100.0, Unit::Sol, &rates()), 1.0));
    }

    #[test]
    fn test_round_trip_through_reference() {
        for unit in Unit::ALL {
            for amount in [0.001, 1.0, 17.25, 5_000.0] {
                let usd = to_reference(amount, unit, &rates());
                assert!(close(from_reference(usd, unit, &rates()), amount));
            }
        }
    }

    #[test]
    fn test_pegged_units_skip_rate_lookup() {
        let table = RateTable::new(0.0, 0.0, 0.0);
        assert_eq!(to_reference(12.5, Unit::Usdc, &table), 12.5);
        assert_eq!(from_reference(12.5, Unit::Usd, &table), 12.5);
    }

    #[test]
    fn test_unpriced_unit_converts_to_zero() {
        let table = RateTable::fallback(None);
        assert_eq!(to_reference(5.0, Unit::Eth, &table), 0.0);
        assert_eq!(from_reference(5.0, Unit::Eth, &table), 0.0);
        let fees = compute_fees(5.0, Unit::Eth, &table);
        assert_eq!(fees.total_fee, 0.0);
        assert_eq!(fees.usd.total_fee, 0.0);
        assert!(fees.total_fee.is_finite());
    }

    #[test]
    fn test_invalid_amounts_yield_zero_breakdown() {
        for amount in [0.0, -1.0, -1000.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            for unit in Unit::ALL {
                let fees = compute_fees(amount, unit, &rates());
                assert_eq!(fees.in_unit(), FeeAmounts::default());
                assert_eq!(fees.usd, FeeAmounts::default());
            }
            assert_eq!(to_reference(amount, Unit::Usd, &rates()), 0.0);
            assert_eq!(from_reference(amount, Unit::Sol, &rates()), 0.0);
        }
    }

    #[test]
    fn test_sol_breakdown_matches_usd_breakdown() {
        let fees = compute_fees(10.0, Unit::Sol, &rates());
        assert!(close(fees.usd.total_fee, 0.7));
        assert!(close(fees.total_fee, 0.007));
        assert!(close(fees.platform_fee, 0.001));
    }

    #[test]
    fn test_compute_fees_is_deterministic() {
        let a = compute_fees(321.123, Unit::Myxn, &rates());
        let b = compute_fees(321.123, Unit::Myxn, &rates());
        assert_eq!(a, b);
    }

    #[test]
    fn test_net_and_gross_amounts() {
        assert!(close(net_amount(1000.0, Unit::Usd, &rates()), 999.3));
        assert!(close(gross_amount(1000.0, Unit::Usd, &rates()), 1000.7));
        assert_eq!(net_amount(-5.0, Unit::Usd, &rates()), 0.0);
        assert_eq!(gross_amount(0.0, Unit::Usd, &rates()), 0.0);
        // Unpriced units pay no estimated fee.
        assert_eq!(net_amount(3.0, Unit::Eth, &RateTable::fallback(None)), 3.0);
    }

    #[test]
    fn test_breakdown_serializes_camel_case() {
        let fees = compute_fees(1000.0, Unit::Usd, &rates());
        let json = serde_json::to_value(fees).unwrap();
        assert_eq!(json["unit"], "USD");
        assert!(json["usd"]["totalFee"].is_number());
        assert!(json["platformFee"].is_number());
        assert!(json.get("platform_fee").is_none());
    }
}
