#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]

//! intersight-relay library: the building blocks of the webhook relay.
//!
//! - `config` — TOML + env-var configuration
//! - `routes` — router and HTTP handlers
//! - `state` — shared handler state
//! - `webex` — WebEx messages client and the alarm card

pub mod config;
pub mod routes;
pub mod state;
pub mod webex;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
pub use webex::WebexClient;
