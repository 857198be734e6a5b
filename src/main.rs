// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use image_embed_node::{
    api::{start_server, AppState},
    catalog::Catalog,
    config::NodeConfig,
    extractor::FeatureExtractor,
    logging,
    vision::OnnxFeatureEncoder,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init(logging::SERVER_FILTER)?;

    info!("🚀 Starting {}", image_embed_node::version::get_version_string());

    let config = NodeConfig::from_env().context("Invalid configuration")?;

    // Load the model once; every request shares it
    let encoder_config = config.encoder.clone();
    let encoder = tokio::task::spawn_blocking(move || OnnxFeatureEncoder::load(&encoder_config))
        .await
        .context("Encoder loading task failed")??;

    let extractor = Arc::new(FeatureExtractor::new(Arc::new(encoder), config.extractor));
    let mut state = AppState::new(extractor);

    match config.catalog_path {
        Some(ref path) => {
            let catalog = Catalog::load(path)?;
            state = state.with_catalog(Arc::new(catalog), config.search);
        }
        None => info!("CATALOG_PATH not set, /search is disabled"),
    }

    start_server(&config, state).await
}
