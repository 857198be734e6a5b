// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::extract::extract_handler;
use super::health::health_handler;
use super::search::search_handler;
use crate::catalog::Catalog;
use crate::config::{NodeConfig, SearchConfig};
use crate::extractor::FeatureExtractor;

/// Room for multipart boundaries and headers on top of the image itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<FeatureExtractor>,
    pub catalog: Option<Arc<Catalog>>,
    pub search: SearchConfig,
}

impl AppState {
    pub fn new(extractor: Arc<FeatureExtractor>) -> Self {
        Self {
            extractor,
            catalog: None,
            search: SearchConfig::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<Catalog>, search: SearchConfig) -> Self {
        self.catalog = Some(catalog);
        self.search = search;
        self
    }
}

/// Build the router with all routes and layers
pub fn create_app(state: AppState) -> Router {
    let body_limit = state
        .extractor
        .config()
        .max_image_bytes
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(health_handler))
        .route("/extract", post(extract_handler))
        .route("/search", post(search_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to the configured address and serve until ctrl-c
pub async fn start_server(config: &NodeConfig, state: AppState) -> Result<()> {
    let addr = config.listen_addr()?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Feature extraction server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
