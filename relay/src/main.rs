#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # intersight-relay
//!
//! Receives Intersight alarm webhooks and forwards each alarm to a WebEx room
//! as an adaptive card.
//!
//! Point an Intersight webhook subscription (Settings > Webhooks, event
//! `cond.Alarm`) at `http://<host>:8080/webhook`.
//!
//! ## API surface
//!
//! | Method | Path       | Description                                   |
//! |--------|------------|-----------------------------------------------|
//! | GET    | `/health`  | Liveness probe                                |
//! | POST   | `/webhook` | Intersight event delivery, relayed to WebEx   |
//!
//! Any other method on `/webhook` gets `400 Bad Request`.
//!
//! ## Architecture
//!
//! ```text
//! main.rs          — entry point, clap subcommands, graceful shutdown
//! config.rs        — TOML + env-var configuration
//! state.rs         — AppState shared by handlers
//! webex.rs         — WebEx messages client, adaptive card template
//! routes/
//!   mod.rs         — router
//!   health.rs      — GET /health
//!   webhook.rs     — POST /webhook
//! ```

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use intersight_relay::{router, AppState, Config, WebexClient};

/// Intersight alarm webhook to WebEx relay.
#[derive(Parser)]
#[command(name = "intersight-relay", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to TOML config file (when no subcommand is given).
    #[arg(long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default when no subcommand given).
    Serve {
        /// Path to TOML config file.
        #[arg(long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = match cli.command {
        Some(Commands::Serve { config }) => config.or(cli.config),
        None => cli.config,
    };

    let config = match Config::load(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("intersight-relay: configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    if let Err(e) = run_server(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("intersight-relay v{} starting", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}", config.server.listen);

    if config.webex.token.is_empty() || config.webex.room_id.is_empty() {
        warn!("WebEx token or room id not set, set WEBEX_TOKEN / WEBEX_ROOM_ID or update config");
    }

    let webex = WebexClient::new(&config.webex)?;
    let state = AppState::new(config, webex);
    let app = router(state.clone());

    let listener = TcpListener::bind(&state.config.server.listen).await?;
    info!("Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Goodbye");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {e}");
                ctrl_c.await.ok();
                info!("Received SIGINT");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received SIGINT");
    }
}
