//! Tracing and logging setup for prompt-evolver.
//!
//! Structured logging with a pretty or JSON output format and
//! environment-based level filtering. The optimizer itself only emits
//! `tracing` events; installing a subscriber is left to the embedding
//! application, which may use [`setup_logging`] for the usual defaults.
//!
//! # Example
//!
//! ```rust,ignore
//! use prompt_evolver::tracing_setup::{setup_logging, should_use_json};
//!
//! setup_logging(should_use_json(), "info")?;
//! ```

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::error::{Error, Result};

/// Environment variable that switches log output to JSON.
pub const LOG_JSON_ENV: &str = "PROMPT_EVOLVER_LOG_JSON";

/// Install a global tracing subscriber.
///
/// * `json` - emit one JSON object per event instead of pretty output.
/// * `default_level` - filter used when `RUST_LOG` is not set
///   (e.g. "info", "prompt_evolver=debug").
///
/// Fails if a global subscriber is already installed.
pub fn setup_logging(json: bool, default_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init()
    };

    installed.map_err(|e| Error::internal(format!("Failed to install tracing subscriber: {}", e)))
}

/// Check if JSON logging is requested via [`LOG_JSON_ENV`].
pub fn should_use_json() -> bool {
    std::env::var(LOG_JSON_ENV)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}
