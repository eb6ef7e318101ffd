//! Human-readable amount parsing.
//!
//! Accepts the forms people type into a payment form: `"1000"`,
//! `"1,000.50"`, `"$12"`, `" 0.5 "`. Parsing goes through [`Decimal`] so the
//! textual value is validated exactly before it becomes an `f64`.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Errors from [`parse_amount`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    /// The input is empty once whitespace and currency symbols are removed.
    #[error("amount is empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid amount '{0}'")]
    Invalid(String),
    /// The input is below zero.
    #[error("amount must not be negative: {0}")]
    Negative(String),
}

/// Parses a money string into a non-negative `f64`.
///
/// # Errors
///
/// Returns [`AmountParseError`] for empty, non-numeric or negative input.
pub fn parse_amount(input: &str) -> Result<f64, AmountParseError> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim_start();
    let cleaned: String = trimmed.chars().filter(|c| *c != ',' && *c != '_').collect();
    if cleaned.is_empty() {
        return Err(AmountParseError::Empty);
    }

    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| AmountParseError::Invalid(input.trim().to_owned()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountParseError::Negative(input.trim().to_owned()));
    }
    value
        .to_f64()
        .ok_or_else(|| AmountParseError::Invalid(input.trim().to_owned()))
}
