//! p2pay
//!
//! Terminal client for the p2pay wallet: derive addresses, inspect the
//! account, send USDC and pay UPI merchants.

mod commands;
mod config;
mod scanner;

use clap::{Parser, Subcommand};
use commands::Context;
use config::{ConfigLoader, Overrides};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// p2pay - crypto-to-fiat wallet client
#[derive(Parser, Debug)]
#[command(name = "p2pay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file [default: ./p2pay.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the backend base URL (e.g., http://localhost:5050)
    #[arg(long, global = true)]
    backend: Option<Url>,

    /// User id issued by the identity provider
    #[arg(long, env = "P2PAY_UID", global = true)]
    uid: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the wallet address derived from a user id
    Derive {
        /// Identifier to derive from [default: the configured uid]
        identifier: Option<String>,

        /// Also print the private key
        #[arg(long)]
        show_private_key: bool,
    },

    /// Fetch or provision the wallet for the configured user
    Login,

    /// Show wallet address, balance and recent transactions
    Dashboard,

    /// Quote an INR amount in USDC
    Quote {
        /// Amount in INR
        amount_inr: String,
    },

    /// Send USDC to an address
    Send {
        /// Recipient wallet address
        #[arg(long)]
        to: String,

        /// Amount of USDC
        #[arg(long)]
        amount: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Pay a UPI merchant in INR from the USDC balance
    Pay {
        /// Merchant UPI id
        #[arg(long, required_unless_present = "scan", conflicts_with = "scan")]
        upi: Option<String>,

        /// Read decoded QR text from stdin instead of --upi
        #[arg(long)]
        scan: bool,

        /// Amount in INR
        #[arg(long)]
        amount_inr: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    let config_loader = ConfigLoader::new(
        args.config.as_ref(),
        Overrides {
            backend: args.backend,
            uid: args.uid,
        },
    );
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::debug!(backend = %loaded_config.backend_url, "Configuration loaded");

    let ctx = Context::new(loaded_config)?;
    match args.command {
        Command::Derive {
            identifier,
            show_private_key,
        } => commands::derive(&ctx, identifier, show_private_key),
        Command::Login => commands::login(&ctx).await,
        Command::Dashboard => commands::dashboard(&ctx).await,
        Command::Quote { amount_inr } => commands::quote(&ctx, amount_inr).await,
        Command::Send { to, amount, yes } => commands::send(&ctx, to, amount, yes).await,
        Command::Pay {
            upi,
            scan,
            amount_inr,
            yes,
        } => commands::pay(&ctx, upi, scan, amount_inr, yes).await,
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
