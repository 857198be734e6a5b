// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tracing setup shared by the server and the CLI
//!
//! Logs always go to stderr so that stdout stays reserved for the CLI's JSON
//! result. The filter comes from `RUST_LOG`; without it ONNX Runtime's own
//! chatter is capped at warnings (server) or errors (CLI).

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Default filter for the HTTP server
pub const SERVER_FILTER: &str = "info,ort=warn,tower_http=info";

/// Default filter for the CLI
pub const CLI_FILTER: &str = "warn,ort=error";

/// Build the filter from `RUST_LOG`, falling back to `default_filter`
pub fn env_filter(default_filter: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| anyhow!("Invalid log filter '{}': {}", default_filter, e)),
    }
}

/// Install the global stderr subscriber
pub fn init(default_filter: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter)?)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
