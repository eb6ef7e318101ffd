//! Currency units accepted by the fee engine.
//!
//! The set is closed: one reference fiat unit ([`Unit::Usd`]), one
//! stable-pegged unit ([`Unit::Usdc`]) and three volatile assets whose
//! price must be looked up in a [`RateTable`](crate::rates::RateTable).
//!
//! Unknown tickers are rejected when parsing, so every function taking a
//! [`Unit`] works on a recognized unit.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A currency unit priced in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    /// US dollar, the reference fiat unit. Its rate is always exactly 1.
    Usd,
    /// USD Coin, pegged 1:1 to [`Unit::Usd`] without a rate lookup.
    Usdc,
    /// Solana native token.
    Sol,
    /// MyXenPay platform token.
    Myxn,
    /// Ether.
    Eth,
}

impl Unit {
    /// Every supported unit, reference fiat first.
    pub const ALL: [Self; 5] = [Self::Usd, Self::Usdc, Self::Sol, Self::Myxn, Self::Eth];

    /// Units whose price comes from a rate table.
    pub const VOLATILE: [Self; 3] = [Self::Sol, Self::Myxn, Self::Eth];

    /// Returns the upper-case ticker (e.g. `"SOL"`).
    #[must_use]
    pub const fn ticker(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Usdc => "USDC",
            Self::Sol => "SOL",
            Self::Myxn => "MYXN",
            Self::Eth => "ETH",
        }
    }

    /// Returns `true` for the reference fiat unit.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Usd)
    }

    /// Returns `true` for units converted 1:1 with the reference fiat.
    #[must_use]
    pub const fn is_pegged(self) -> bool {
        matches!(self, Self::Usd | Self::Usdc)
    }

    /// Returns `true` for units that need a rate lookup.
    #[must_use]
    pub const fn is_volatile(self) -> bool {
        !self.is_pegged()
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

/// A ticker that does not name a supported [`Unit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown currency unit '{0}'")]
pub struct UnknownUnitError(pub String);

impl FromStr for Unit {
    type Err = UnknownUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ticker = s.trim();
        Self::ALL
            .into_iter()
            .find(|unit| unit.ticker().eq_ignore_ascii_case(ticker))
            .ok_or_else(|| UnknownUnitError(ticker.to_owned()))
    }
}
