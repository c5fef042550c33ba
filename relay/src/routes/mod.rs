//! HTTP route handlers.
//!
//! None of the routes are authenticated: Intersight delivers webhooks without
//! a credential the relay checks, and [`health`] is a plain liveness probe.

pub mod health;
pub mod webhook;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the relay's router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/webhook",
            post(webhook::receive).fallback(webhook::reject_method),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
