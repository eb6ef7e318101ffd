//! Command line surface and command execution.
//!
//! Every command resolves to a JSON document; printing is left to the
//! binary so commands can be exercised in-process.

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use xenfee::amount::parse_amount;
use xenfee::cache::RateSource;
use xenfee::payment_link::{
    self, DEFAULT_LABEL, DEFAULT_MESSAGE, EvmNetwork, PaymentLinkError,
};
use xenfee::provider::RateProvider;
use xenfee::{Unit, fees, revenue};

/// MyXenPay fee quotes, conversion rates and payment links.
#[derive(Debug, Parser)]
#[command(name = "xenfee", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, env = "CONFIG")]
    pub config: Option<String>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the current USD conversion rates.
    Rates {
        /// Bypass the cache and query the price feed.
        #[arg(long)]
        force: bool,
    },
    /// Quote the fees for a payment.
    Fees {
        /// Payment amount, e.g. `100`, `$1,250.50` or `2.5`.
        #[arg(value_parser = parse_amount)]
        amount: f64,
        /// Payment unit (USD, USDC, SOL, MYXN, ETH).
        unit: Unit,
    },
    /// Split a fee amount into burn, development and operations shares.
    Allocate {
        /// Fee amount to split.
        #[arg(value_parser = parse_amount)]
        amount: f64,
    },
    /// Build a wallet payment link for a USD amount.
    Link {
        /// Link flavour.
        #[command(subcommand)]
        target: LinkTarget,
    },
}

/// Payment link flavours.
#[derive(Debug, Clone, Subcommand)]
pub enum LinkTarget {
    /// Solana Pay transfer request paid in SOL.
    Solana {
        /// Base58 recipient public key.
        recipient: String,
        /// Amount to charge in USD.
        #[arg(long, value_parser = parse_amount)]
        amount_usd: f64,
        /// Label shown by the wallet.
        #[arg(long, default_value = DEFAULT_LABEL)]
        label: String,
        /// Message shown by the wallet.
        #[arg(long, default_value = DEFAULT_MESSAGE)]
        message: String,
    },
    /// EIP-681 transfer request paid in the network's native token.
    Evm {
        /// Hex recipient address.
        recipient: String,
        /// Amount to charge in USD.
        #[arg(long, value_parser = parse_amount)]
        amount_usd: f64,
        /// Target network (base, polygon or bsc).
        #[arg(long, default_value_t = EvmNetwork::Base)]
        network: EvmNetwork,
    },
}

/// Errors raised while executing a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// A payment link could not be built.
    #[error(transparent)]
    PaymentLink(#[from] PaymentLinkError),
    /// A result could not be encoded as JSON.
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

fn source_json(source: RateSource) -> Value {
    match source {
        RateSource::Live => json!({ "kind": "live" }),
        RateSource::Fallback { reason } => {
            json!({ "kind": "fallback", "reason": reason.to_string() })
        }
    }
}

/// Runs `command` against `provider` and returns its JSON output.
///
/// # Errors
///
/// Returns [`CommandError`] if a payment link recipient is invalid or the
/// output cannot be encoded.
pub async fn execute(command: Command, provider: &RateProvider) -> Result<Value, CommandError> {
    match command {
        Command::Rates { force } => {
            let snapshot = provider.get_snapshot(force).await;
            Ok(json!({
                "rates": snapshot.rates,
                "source": source_json(snapshot.source),
            }))
        }
        Command::Fees { amount, unit } => {
            let rates = provider.get_rates(false).await;
            let breakdown = fees::compute_fees(amount, unit, &rates);
            Ok(json!({
                "amount": amount,
                "unit": unit,
                "priced": rates.is_priced(unit),
                "fees": serde_json::to_value(breakdown)?,
                "netAmount": fees::net_amount(amount, unit, &rates),
                "grossAmount": fees::gross_amount(amount, unit, &rates),
            }))
        }
        Command::Allocate { amount } => Ok(serde_json::to_value(revenue::allocate(amount))?),
        Command::Link { target } => {
            let rates = provider.get_rates(false).await;
            let url = match target {
                LinkTarget::Solana {
                    recipient,
                    amount_usd,
                    label,
                    message,
                } => {
                    payment_link::solana_pay_url(&recipient, amount_usd, &rates, &label, &message)?
                }
                LinkTarget::Evm {
                    recipient,
                    amount_usd,
                    network,
                } => payment_link::eip681_url(&recipient, network, amount_usd, &rates)?,
            };
            Ok(json!({ "url": url.as_str() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xenfee::feed::{FeedQuote, NoFeed, StaticFeed};

    fn live_provider() -> RateProvider {
        RateProvider::new(StaticFeed(FeedQuote {
            sol: Some(100.0),
            eth: Some(2000.0),
            myxn: Some(0.5),
        }))
    }

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["xenfee"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fees_arguments() {
        let Command::Fees { amount, unit } = parse(&["fees", "$1,000", "sol"]) else {
            panic!("expected fees command");
        };
        assert_eq!(amount, 1000.0);
        assert_eq!(unit, Unit::Sol);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Cli::try_parse_from(["xenfee", "fees", "ten", "USD"]).is_err());
        assert!(Cli::try_parse_from(["xenfee", "fees", "10", "DOGE"]).is_err());
        assert!(Cli::try_parse_from(["xenfee", "fees", "-5", "USD"]).is_err());
    }

    #[tokio::test]
    async fn test_rates_reports_live_source() {
        let out = execute(Command::Rates { force: false }, &live_provider())
            .await
            .unwrap();
        assert_eq!(out["source"]["kind"], "live");
        assert_eq!(out["rates"]["SOL"], 100.0);
        assert_eq!(out["rates"]["USD"], 1.0);
    }

    #[tokio::test]
    async fn test_rates_reports_fallback_reason() {
        let out = execute(Command::Rates { force: true }, &RateProvider::new(NoFeed))
            .await
            .unwrap();
        assert_eq!(out["source"]["kind"], "fallback");
        assert_eq!(out["source"]["reason"], "not_configured");
        assert_eq!(out["rates"]["SOL"], 0.0);
    }

    #[tokio::test]
    async fn test_fees_command() {
        let out = execute(
            Command::Fees {
                amount: 10.0,
                unit: Unit::Sol,
            },
            &live_provider(),
        )
        .await
        .unwrap();
        assert_eq!(out["priced"], true);
        assert_eq!(out["fees"]["unit"], "SOL");
        let usd_total = out["fees"]["usd"]["totalFee"].as_f64().unwrap();
        assert!((usd_total - 0.7).abs() < 1e-9);
        let net = out["netAmount"].as_f64().unwrap();
        assert!((net - 9.993).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fees_command_for_unpriced_unit() {
        let out = execute(
            Command::Fees {
                amount: 10.0,
                unit: Unit::Myxn,
            },
            &RateProvider::new(NoFeed),
        )
        .await
        .unwrap();
        assert_eq!(out["priced"], false);
        assert_eq!(out["fees"]["totalFee"], 0.0);
        assert_eq!(out["netAmount"], 10.0);
    }

    #[tokio::test]
    async fn test_allocate_command() {
        let out = execute(Command::Allocate { amount: 100.0 }, &live_provider())
            .await
            .unwrap();
        for (share, expected) in [("burn", 30.0), ("development", 40.0), ("operations", 30.0)] {
            let value = out[share].as_f64().unwrap();
            assert!((value - expected).abs() < 1e-9, "{share} = {value}");
        }
    }

    #[tokio::test]
    async fn test_link_commands() {
        let provider = live_provider();
        let solana = execute(
            parse(&[
                "link",
                "solana",
                "57oUbtUKNaQu8KActsPSNg61LFV7u4tTjHY1Ek4PVRyj",
                "--amount-usd",
                "50",
            ]),
            &provider,
        )
        .await
        .unwrap();
        let url = solana["url"].as_str().unwrap();
        assert!(url.starts_with("solana:57oUbtUKNaQu8KActsPSNg61LFV7u4tTjHY1Ek4PVRyj?"));
        assert!(url.contains("amount=0.500000"));

        let evm = execute(
            parse(&[
                "link",
                "evm",
                "0x000000000000000000000000000000000000dEaD",
                "--amount-usd",
                "2000",
            ]),
            &provider,
        )
        .await
        .unwrap();
        assert_eq!(
            evm["url"],
            "ethereum:0x000000000000000000000000000000000000dEaD@8453?value=0xde0b6b3a7640000"
        );
    }

    #[tokio::test]
    async fn test_evm_link_on_polygon_leaves_value_to_wallet() {
        let out = execute(
            parse(&[
                "link",
                "evm",
                "0x000000000000000000000000000000000000dEaD",
                "--amount-usd",
                "2000",
                "--network",
                "polygon",
            ]),
            &live_provider(),
        )
        .await
        .unwrap();
        assert_eq!(
            out["url"],
            "ethereum:0x000000000000000000000000000000000000dEaD@137?value=0x0"
        );
        let unknown_network = [
            "xenfee",
            "link",
            "evm",
            "0x1",
            "--amount-usd",
            "1",
            "--network",
            "fantom",
        ];
        assert!(Cli::try_parse_from(unknown_network).is_err());
    }

    #[tokio::test]
    async fn test_link_rejects_invalid_recipient() {
        let err = execute(
            parse(&["link", "evm", "0x1234", "--amount-usd", "10"]),
            &live_provider(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            CommandError::PaymentLink(PaymentLinkError::InvalidRecipient(_))
        ));
    }
}
