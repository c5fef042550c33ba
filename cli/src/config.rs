//! Command-line and environment configuration for the `intersight` binary.
//!
//! Settings are resolved from (highest wins):
//!
//! 1. **Command-line flags**: `--client-id`, `--base-url`, ...
//! 2. **Environment variables**: `ClientId`, `ClientSecret`, `INTERSIGHT_URL`
//! 3. **`.env` file** in the working directory, loaded into the environment at
//!    startup
//! 4. **Compiled defaults**
//!
//! `ClientID` (the older spelling) is still read when `ClientId` is unset.
//! The client secret is never accepted on the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::client::{ClientSettings, Credentials, MAX_PAGE_SIZE};

pub const DEFAULT_BASE_URL: &str = "https://intersight.com";

/// Cisco Intersight automation tools.
#[derive(Parser)]
#[command(name = "intersight", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// OAuth 2.0 client ID (default: `ClientId` env var).
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// Intersight base URL (default: `INTERSIGHT_URL` env var, then intersight.com).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds (at least 1).
    #[arg(
        long,
        global = true,
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Results requested per page when listing collections (max 1000).
    #[arg(long, global = true, default_value_t = MAX_PAGE_SIZE)]
    pub page_size: usize,

    /// tracing filter for diagnostics on stderr. Overridden by `RUST_LOG`.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// List UCS blade servers (IMM and UCSM) that have no profile.
    AvailableServers,
    /// Reserve WWPNs and assign them to server profile vHBAs.
    ReserveWwpn {
        /// JSON file with one record per server profile.
        #[arg(long, default_value = "py_input.json")]
        input: PathBuf,
    },
}

/// One server profile's worth of WWPN assignment input.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerRecord {
    pub org_name: String,
    pub fcpool_name: String,
    pub sp_name: String,
    pub sanconn_policy_name: String,
    pub vhba0_name: String,
    pub vhba0_wwpn: String,
    pub vhba1_name: String,
    pub vhba1_wwpn: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Record {index} ({sp_name}): {reason}")]
    Invalid {
        index: usize,
        sp_name: String,
        reason: String,
    },
}

/// Resolve client settings from the CLI and the process environment.
pub fn client_settings(cli: &Cli) -> Result<ClientSettings, ConfigError> {
    settings_from(cli, |key| std::env::var(key).ok())
}

fn settings_from(
    cli: &Cli,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, ConfigError> {
    let client_id = cli
        .client_id
        .clone()
        .or_else(|| env("ClientId"))
        .or_else(|| {
            let legacy = env("ClientID");
            if legacy.is_some() {
                warn!("ClientID is deprecated, set ClientId instead");
            }
            legacy
        })
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing("ClientId"))?;
    let client_secret = env("ClientSecret")
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing("ClientSecret"))?;
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env("INTERSIGHT_URL"))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    Ok(ClientSettings {
        base_url,
        credentials: Credentials {
            client_id,
            client_secret,
        },
        timeout: Duration::from_secs(cli.timeout_secs),
        page_size: cli.page_size,
    })
}

/// Load and validate the WWPN assignment records.
pub fn load_records(path: &Path) -> Result<Vec<ServerRecord>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<ServerRecord> =
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    for (index, record) in records.iter().enumerate() {
        if let Err(reason) = validate(record) {
            return Err(ConfigError::Invalid {
                index,
                sp_name: record.sp_name.clone(),
                reason,
            });
        }
    }
    Ok(records)
}

fn validate(record: &ServerRecord) -> Result<(), String> {
    for (field, value) in [
        ("org_name", &record.org_name),
        ("fcpool_name", &record.fcpool_name),
        ("sp_name", &record.sp_name),
        ("sanconn_policy_name", &record.sanconn_policy_name),
        ("vhba0_name", &record.vhba0_name),
        ("vhba1_name", &record.vhba1_name),
    ] {
        if value.trim().is_empty() {
            return Err(format!("{field} is empty"));
        }
    }
    if record.vhba0_name == record.vhba1_name {
        return Err(format!("duplicate vHBA name '{}'", record.vhba0_name));
    }
    for wwpn in [&record.vhba0_wwpn, &record.vhba1_wwpn] {
        if !is_wwpn(wwpn) {
            return Err(format!("'{wwpn}' is not a WWPN"));
        }
    }
    Ok(())
}

/// Eight colon-separated hex octets, e.g. `20:00:00:25:B5:AA:AA:31`.
pub fn is_wwpn(s: &str) -> bool {
    let octets: Vec<&str> = s.split(':').collect();
    octets.len() == 8
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}
