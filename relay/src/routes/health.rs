//! Unauthenticated health-check endpoint.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// `GET /health` — liveness probe.
///
/// Returns status, uptime and version. Does not contact WebEx.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "webex_configured": !state.config.webex.token.is_empty()
            && !state.config.webex.room_id.is_empty(),
    }))
}
