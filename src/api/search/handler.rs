// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Similarity search endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::{debug, info};

use super::response::SearchResponse;
use crate::api::errors::ApiError;
use crate::api::extract::run_extraction;
use crate::api::http_server::AppState;
use crate::api::multipart::read_image_field;
use crate::extractor::ExtractError;

/// POST /search - Find catalog items that look like the uploaded image
///
/// # Request
/// Multipart form with the image bytes in the `image` field.
///
/// # Response
/// - `results`: up to `SEARCH_LIMIT` catalog items whose similarity is at
///   least `SEARCH_THRESHOLD * 100`, each with its extra fields and a
///   `similarity` percentage
///
/// # Errors
/// - 400 Bad Request: missing image, disallowed extension, undecodable image
/// - 503 Service Unavailable: no catalog loaded
/// - 500 Internal Server Error: preprocessing or inference failed
pub async fn search_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let catalog = state
        .catalog
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("No catalog loaded".to_string()))?;

    let input = read_image_field(multipart)
        .await?
        .ok_or(ExtractError::MissingInput)?;

    let features = run_extraction(state.extractor.clone(), input).await?;
    debug!("Query features length: {}", features.len());

    let results = catalog.search(features.as_slice(), state.search.threshold, state.search.limit);

    info!(
        "Search matched {} of {} catalog items",
        results.len(),
        catalog.len()
    );

    Ok(Json(SearchResponse { results }))
}
