//! `HashLease` CLI
//!
//! Thin operator interface for the `HashLease` server: triggers sweep
//! passes over gRPC (suitable as the trusted cron entry point) and reads
//! rental accrual status.

mod client;
mod status_cmd;
mod sweep_cmd;

use std::io;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "hashlease")]
#[command(version, about = "HashLease operator CLI", long_about = None)]
struct Cli {
    /// Server address
    #[arg(long, default_value = "http://127.0.0.1:50061", env = "HASHLEASE_ADDR")]
    addr: String,

    /// Shared secret presented as a bearer token
    #[arg(long, env = "HASHLEASE_SWEEP_SECRET")]
    secret: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one expiry sweep pass and print the JSON summary
    Sweep,
    /// Print the accrual status of one rental
    Status {
        /// Rental ID to inspect
        rental_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "hashlease=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), addr = %cli.addr, "Starting hashlease CLI");

    match cli.command {
        Command::Sweep => sweep_cmd::run(&cli.addr, &cli.secret).await,
        Command::Status { rental_id } => status_cmd::run(&cli.addr, &cli.secret, &rental_id).await,
    }
}
