//! Configuration loading and defaults.
//!
//! Configuration is resolved in order of precedence (highest wins):
//!
//! 1. **Environment variables**: `RELAY_LISTEN`, `WEBEX_TOKEN`,
//!    `WEBEX_ROOM_ID`
//! 2. **Config file**: path via `--config <path>`, or `relay.toml` in CWD
//! 3. **Compiled defaults**: see each field's default value below
//!
//! The TOML file mirrors the struct hierarchy:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//!
//! [webex]
//! api_url = "https://webexapis.com/v1/messages"
//! room_id = "Y2lzY29zcGFyazovL3VzL1JPT00v..."
//! token = "bot-access-token"
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub webex: WebexConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind (default `0.0.0.0:8080`).
    #[serde(default = "default_listen")]
    pub listen: String,
}

/// Where alarm cards are posted.
#[derive(Debug, Clone, Deserialize)]
pub struct WebexConfig {
    /// Messages endpoint (default `https://webexapis.com/v1/messages`).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Target room. Override with `WEBEX_ROOM_ID`.
    #[serde(default)]
    pub room_id: String,
    /// Bot or integration access token. Override with `WEBEX_TOKEN`.
    #[serde(default)]
    pub token: String,
    /// Timeout for the outbound message POST in seconds (default 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level (default `info`). Overridden by `RUST_LOG` env var.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_api_url() -> String {
    "https://webexapis.com/v1/messages".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for WebexConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            room_id: String::new(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration with the precedence chain: env vars > file > defaults.
    ///
    /// If `path` is `Some`, that file must exist. Otherwise `relay.toml` in the
    /// current directory is used when present.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(Path::new(p))?,
            None if Path::new("relay.toml").exists() => Self::from_file(Path::new("relay.toml"))?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(listen) = env("RELAY_LISTEN") {
            self.server.listen = listen;
        }
        if let Some(token) = env("WEBEX_TOKEN") {
            self.webex.token = token;
        }
        if let Some(room) = env("WEBEX_ROOM_ID") {
            self.webex.room_id = room;
        }
    }
}
