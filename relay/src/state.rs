//! Shared application state passed to every handler via Axum's `State` extractor.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::webex::WebexClient;

/// Shared application state for the relay.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup.
    pub config: Arc<Config>,
    /// Monotonic instant when the server started (for uptime calculation).
    pub start_time: Instant,
    /// Outbound WebEx client; cloning shares the connection pool.
    pub webex: WebexClient,
}

impl AppState {
    pub fn new(config: Config, webex: WebexClient) -> Self {
        Self {
            config: Arc::new(config),
            start_time: Instant::now(),
            webex,
        }
    }
}
