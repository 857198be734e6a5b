// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feature extraction endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::response::ExtractResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::multipart::read_image_field;
use crate::extractor::{ExtractError, FeatureExtractor, FeatureVector, ImageInput};

/// POST /extract - Extract a feature vector from an uploaded image
///
/// # Request
/// Multipart form with the image bytes in the `image` field.
///
/// # Response
/// - `features`: the pooled embedding, one float per model output channel
///
/// # Errors
/// - 400 Bad Request: missing image, disallowed extension, undecodable image
/// - 500 Internal Server Error: preprocessing or inference failed
pub async fn extract_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let input = read_image_field(multipart)
        .await?
        .ok_or(ExtractError::MissingInput)?;

    let started = Instant::now();
    let features = run_extraction(state.extractor.clone(), input).await?;

    info!(
        "Extracted {} features in {}ms",
        features.len(),
        started.elapsed().as_millis()
    );

    Ok(Json(ExtractResponse::new(features)))
}

/// Run the blocking decode/preprocess/inference sequence off the async runtime
///
/// A panic inside the pipeline surfaces as `InferenceFailure`; the server keeps
/// serving.
pub async fn run_extraction(
    extractor: Arc<FeatureExtractor>,
    input: ImageInput,
) -> Result<FeatureVector, ExtractError> {
    tokio::task::spawn_blocking(move || extractor.extract(&input))
        .await
        .map_err(|e| ExtractError::inference(format!("extraction task failed: {}", e)))?
}
