//! Payment request links for QR codes.
//!
//! Builds [Solana Pay] transfer URLs and [EIP-681] native-transfer URLs for
//! a USD-denominated amount, converted at the given rates. These are plain
//! request links: wallets construct and sign the actual transaction.
//!
//! [Solana Pay]: https://docs.solanapay.com/spec
//! [EIP-681]: https://eips.ethereum.org/EIPS/eip-681

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use url::Url;

use crate::fees::from_reference;
use crate::rates::RateTable;
use crate::unit::Unit;

/// Base mainnet chain ID.
pub const BASE_CHAIN_ID: u64 = 8453;

/// Polygon PoS mainnet chain ID.
pub const POLYGON_CHAIN_ID: u64 = 137;

/// BNB Smart Chain mainnet chain ID.
pub const BSC_CHAIN_ID: u64 = 56;

/// Characters `encodeURIComponent` leaves as-is, besides ASCII alphanumerics.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// EVM networks a native-transfer link can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvmNetwork {
    /// Base mainnet, native token ETH.
    #[default]
    Base,
    /// Polygon PoS, native token POL (formerly MATIC).
    Polygon,
    /// BNB Smart Chain, native token BNB.
    Bsc,
}

impl EvmNetwork {
    /// Every supported network.
    pub const ALL: [Self; 3] = [Self::Base, Self::Polygon, Self::Bsc];

    /// Returns the EIP-155 chain ID.
    #[must_use]
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Base => BASE_CHAIN_ID,
            Self::Polygon => POLYGON_CHAIN_ID,
            Self::Bsc => BSC_CHAIN_ID,
        }
    }

    /// Returns the lowercase network name (e.g. `"polygon"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Polygon => "polygon",
            Self::Bsc => "bsc",
        }
    }

    /// Returns the [`Unit`] of the native token, if a [`RateTable`] can price it.
    ///
    /// POL and BNB are not tracked, so links on those networks carry a zero
    /// value and the wallet asks the payer for the amount.
    #[must_use]
    pub const fn native_unit(self) -> Option<Unit> {
        match self {
            Self::Base => Some(Unit::Eth),
            Self::Polygon | Self::Bsc => None,
        }
    }
}

impl Display for EvmNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A name that does not match a supported [`EvmNetwork`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown EVM network '{0}' (expected base, polygon or bsc)")]
pub struct UnknownNetworkError(pub String);

impl FromStr for EvmNetwork {
    type Err = UnknownNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|network| network.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownNetworkError(name.to_owned()))
    }
}

/// Default Solana Pay label.
pub const DEFAULT_LABEL: &str = "MyXenPay Payment";

/// Default Solana Pay message.
pub const DEFAULT_MESSAGE: &str = "Thank you for your purchase";

/// Errors from payment link construction.
#[derive(Debug, thiserror::Error)]
pub enum PaymentLinkError {
    /// The recipient is not a valid address for the target chain.
    #[error("invalid recipient address '{0}'")]
    InvalidRecipient(String),
    /// The amount does not fit into a native token value.
    #[error("amount {0} is out of range")]
    AmountOutOfRange(f64),
    /// The link could not be assembled.
    #[error("failed to build payment URL: {0}")]
    Url(#[from] url::ParseError),
}

fn validate_solana_recipient(recipient: &str) -> Result<(), PaymentLinkError> {
    match bs58::decode(recipient).into_vec() {
        Ok(bytes) if bytes.len() == 32 => Ok(()),
        _ => Err(PaymentLinkError::InvalidRecipient(recipient.to_owned())),
    }
}

/// Builds a Solana Pay transfer link paying `amount_usd` worth of SOL.
///
/// The `amount` parameter is omitted when SOL has no price, leaving the
/// wallet to ask the payer for an amount.
///
/// # Errors
///
/// Returns [`PaymentLinkError::InvalidRecipient`] if `recipient` is not a
/// base58 encoded 32 byte public key.
pub fn solana_pay_url(
    recipient: &str,
    amount_usd: f64,
    rates: &RateTable,
    label: &str,
    message: &str,
) -> Result<Url, PaymentLinkError> {
    validate_solana_recipient(recipient)?;
    let mut link = format!(
        "solana:{recipient}?label={}&message={}",
        utf8_percent_encode(label, URI_COMPONENT),
        utf8_percent_encode(message, URI_COMPONENT),
    );
    let amount_sol = from_reference(amount_usd, Unit::Sol, rates);
    if amount_sol > 0.0 {
        link.push_str(&format!("&amount={amount_sol:.6}"));
    }
    Ok(Url::parse(&link)?)
}

/// Converts a native token amount into its 18-decimal base unit, rounding down.
fn to_base_units(amount: f64) -> Result<U256, PaymentLinkError> {
    let out_of_range = || PaymentLinkError::AmountOutOfRange(amount);
    let native = Decimal::from_f64(amount).ok_or_else(out_of_range)?;
    let base_units = native
        .checked_mul(Decimal::from(1_000_000_000_000_000_000_u64))
        .ok_or_else(out_of_range)?
        .floor();
    base_units
        .to_u128().map(U256::from).ok_or_else(out_of_range)
}

/// Builds an EIP-681 link transferring `amount_usd` worth of the native
/// token of `network`.
///
/// The value is `0x0` when the native token has no price in `rates`.
///
/// # Errors
///
/// Returns [`PaymentLinkError::InvalidRecipient`] for a malformed address
/// and [`PaymentLinkError::AmountOutOfRange`] when the value overflows.
pub fn eip681_url(
    recipient: &str,
    network: EvmNetwork,
    amount_usd: f64,
    rates: &RateTable,
) -> Result<Url, PaymentLinkError> {
    let address = Address::from_str(recipient)
        .map_err(|_| PaymentLinkError::InvalidRecipient(recipient.to_owned()))?;
    let native_amount = network
        .native_unit()
        .map_or(0.0, |unit| from_reference(amount_usd, unit, rates));
    let value = to_base_units(native_amount)?;
    let chain_id = network.chain_id();
    let url = Url::parse(&format!("ethereum:{address}@{chain_id}?value={value:#x}"))?;
    Ok(url)
}
