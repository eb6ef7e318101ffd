//! MyXenPay fee engine command line.
//!
//! # Usage
//!
//! ```bash
//! # Current conversion rates
//! xenfee rates --force
//!
//! # Fees for a 2.5 SOL payment
//! xenfee fees 2.5 SOL
//!
//! # Revenue split of a fee
//! xenfee allocate 12.40
//!
//! # Payment links
//! xenfee link solana <RECIPIENT> --amount-usd 25
//! xenfee link evm <ADDRESS> --amount-usd 25 --network polygon
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to TOML configuration file (default: `xenfee.toml`)
//! - `COINGECKO_URL`, `CG_ID_MYXN`, `MYXN_PRICE_USD` — Feed overrides
//! - `RUST_LOG` — Log level filter (default: `info`)

use clap::Parser;

use xenfee_cli::commands::{Cli, execute};
use xenfee_cli::config::XenfeeConfig;

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine readable.
    #[cfg(feature = "telemetry")]
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        #[cfg(feature = "telemetry")]
        tracing::error!("xenfee failed: {e}");
        #[cfg(not(feature = "telemetry"))]
        eprintln!("xenfee failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = XenfeeConfig::load(cli.config.as_deref())?;
    #[cfg(feature = "telemetry")]
    tracing::debug!(
        coingecko_url = %config.coingecko_url,
        myxn_id = ?config.myxn_coingecko_id,
        offline = config.offline,
        "Loaded configuration"
    );

    let provider = config.rate_provider()?;
    let output = execute(cli.command, &provider).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
