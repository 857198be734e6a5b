// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::http_server::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub dimension: usize,
    pub catalog_items: Option<usize>,
    pub version: String,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.extractor.model_name().to_string(),
        dimension: state.extractor.dimension(),
        catalog_items: state.catalog.as_ref().map(|c| c.len()),
        version: crate::version::VERSION.to_string(),
    })
}
