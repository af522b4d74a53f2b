//! cartsync CLI - Inspect and edit the synchronized cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the locally saved cart (no network)
//! cartsync show
//!
//! # Load the cart from the remote service, falling back to the saved cart
//! cartsync load
//!
//! # Add one unit of a product
//! cartsync add --id p1 --title "Widget" --price 10.00
//!
//! # Set or remove a line
//! cartsync set p1 5
//! cartsync remove p1
//!
//! # Empty the cart everywhere, or only on this device
//! cartsync clear
//! cartsync reset
//! ```
//!
//! Configuration comes from the environment (or a `.env` file); see
//! `cartsync::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

const DEFAULT_LOG_FILTER: &str = "cartsync=info,cartsync_cli=info";

#[derive(Parser)]
#[command(name = "cartsync")]
#[command(author, version, about = "Synchronized shopping cart CLI")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the locally saved cart without contacting the remote service
    Show,
    /// Load the cart from the remote service
    Load,
    /// Add one unit of a product
    Add {
        /// Product identifier
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Unit price (non-negative decimal)
        #[arg(long, value_parser = parse_price)]
        price: Decimal,

        /// Product image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Set the quantity of a line (0 or less removes it)
    Set {
        /// Item identifier
        id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Item identifier
        id: String,
    },
    /// Empty the cart locally and remotely
    Clear,
    /// Forget the local cart without contacting the remote service
    Reset,
}

fn parse_price(raw: &str) -> Result<Decimal, String> {
    let price: Decimal = raw.parse().map_err(|e| format!("invalid price '{raw}': {e}"))?;
    if price < Decimal::ZERO {
        return Err(format!("price must not be negative: {raw}"));
    }
    Ok(price)
}

fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli.command).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<(), commands::CliError> {
    let session = commands::Session::from_env()?;

    match command {
        Commands::Show => session.show(),
        Commands::Load => session.load().await,
        Commands::Add {
            id,
            title,
            price,
            image,
        } => session.add(id, title, price, image).await,
        Commands::Set { id, quantity } => session.set(id, quantity).await,
        Commands::Remove { id } => session.remove(id).await,
        Commands::Clear => session.clear().await,
        Commands::Reset => session.reset(),
    }
    Ok(())
}
