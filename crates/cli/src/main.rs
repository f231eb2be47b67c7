//! Rocketshoes CLI - inspect and edit the saved cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the saved cart
//! rs-cli show
//!
//! # Add one unit of product 42
//! rs-cli add 42
//!
//! # Set product 42 to 3 units
//! rs-cli update 42 3
//!
//! # Remove product 42
//! rs-cli remove 42
//!
//! # List backend stock with catalog titles
//! rs-cli stock
//! ```
//!
//! The cart lives in the same file store the storefront uses, so edits made
//! here are picked up on the storefront's next start and vice versa.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "rs-cli")]
#[command(author, version, about = "Rocketshoes cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the saved cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Update {
        /// Product ID
        id: ProductId,

        /// New amount (must be at least 1)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// List backend stock joined with catalog titles
    Stock,
}

#[tokio::main]
async fn main() {
    // Command output goes through tracing; library warnings stay quiet unless RUST_LOG asks
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rs_cli=info,rocketshoes_storefront=error".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match &e {
            CliError::Cart(failure) => tracing::error!("{}", failure.user_message()),
            other => tracing::error!("Command failed: {other}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Show => commands::cart::show().await?,
        Commands::Add { id } => commands::cart::add(id).await?,
        Commands::Remove { id } => commands::cart::remove(id).await?,
        Commands::Update { id, amount } => commands::cart::update(id, amount).await?,
        Commands::Stock => commands::stock::list().await?,
    }
    Ok(())
}
