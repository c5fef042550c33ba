//! # intersight
//!
//! Batch tools for Cisco Intersight, authenticated with an OAuth 2.0 client
//! credentials application (Settings > OAuth 2.0 > Create OAuth 2.0 app).
//!
//! ## Subcommands
//!
//! - `intersight available-servers` — blades in IMM and UCSM domains with no
//!   profile
//! - `intersight reserve-wwpn --input py_input.json` — reserve WWPNs from a pool,
//!   attach them to profile vHBAs and add the SAN connectivity policy
//!
//! Report output goes to stdout. Diagnostics go to stderr; any failure exits
//! with status 1.
//!
//! ## Architecture
//!
//! ```text
//! main.rs          — entry point, tracing setup, subcommand dispatch
//! config.rs        — clap CLI, env/.env credentials, input file loading
//! client.rs        — IntersightClient: token acquisition, 401 re-auth, OData
//! model.rs         — typed Intersight managed objects
//! inventory.rs     — blades without profiles
//! reservation.rs   — WWPN reservation pipeline
//! ```

mod client;
mod config;
mod inventory;
mod model;
mod reservation;

use clap::Parser;
use thiserror::Error;
use tracing::info;

use client::{ClientError, IntersightClient};
use config::{Cli, Command, ConfigError};
use reservation::ReserveError;

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Reserve(#[from] ReserveError),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("intersight: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RunError> {
    let settings = config::client_settings(&cli)?;

    match cli.command {
        Command::AvailableServers => {
            let client = IntersightClient::connect(settings).await?;
            let report = inventory::collect(&client).await?;
            print!("{report}");
        }
        Command::ReserveWwpn { input } => {
            let records = config::load_records(&input)?;
            info!("Loaded {} record(s) from {}", records.len(), input.display());
            let client = IntersightClient::connect(settings).await?;
            for record in &records {
                let assignment = reservation::assign(&client, record).await?;
                print!("{assignment}");
            }
        }
    }
    Ok(())
}
