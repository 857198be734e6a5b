// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload parsing shared by the image endpoints

use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::debug;

use super::errors::ApiError;
use crate::extractor::ImageInput;

/// Name of the multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Pull the `image` field out of a multipart body
///
/// Returns `Ok(None)` when the request is not multipart at all or has no
/// `image` field; the caller reports that as missing input. Other fields are
/// skipped.
pub async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<ImageInput>, ApiError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!("Request body is not multipart: {}", rejection);
            return Ok(None);
        }
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to read image upload: {}", e)))?;

        debug!(
            "Received image upload {:?} ({} bytes)",
            filename,
            bytes.len()
        );

        return Ok(Some(ImageInput::new(bytes.to_vec(), filename)));
    }

    Ok(None)
}
