// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ExtractError, FeatureVector, ImageInput};
use crate::vision::image_utils::{decode_image_bytes_with_limit, file_extension, has_allowed_extension};
use crate::vision::{preprocess, FeatureEncoder, PreprocessConfig, MAX_IMAGE_SIZE};

/// Check a filename against the jpg/jpeg/png allow-list (case-insensitive)
///
/// A filename without an extension is rejected.
pub fn validate_extension(filename: &str) -> Result<(), ExtractError> {
    if has_allowed_extension(filename) {
        Ok(())
    } else {
        Err(ExtractError::UnsupportedFileType(
            file_extension(filename).unwrap_or_default(),
        ))
    }
}

/// Validation and preprocessing settings for a [`FeatureExtractor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub preprocess: PreprocessConfig,
    /// Reject filenames outside the jpg/jpeg/png allow-list before decoding.
    /// Decoding stays authoritative either way.
    pub check_extension: bool,
    /// Upper bound on the raw payload size
    pub max_image_bytes: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            check_extension: false,
            max_image_bytes: MAX_IMAGE_SIZE,
        }
    }
}

/// Immutable extraction service, built once at startup and shared by handle
pub struct FeatureExtractor {
    encoder: Arc<dyn FeatureEncoder>,
    config: ExtractorConfig,
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("model", &self.encoder.model_name())
            .field("dimension", &self.encoder.dimension())
            .field("config", &self.config)
            .finish()
    }
}

impl FeatureExtractor {
    pub fn new(encoder: Arc<dyn FeatureEncoder>, config: ExtractorConfig) -> Self {
        Self { encoder, config }
    }

    pub fn model_name(&self) -> &str {
        self.encoder.model_name()
    }

    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Check the input and decode it
    ///
    /// # Errors
    /// - `MissingInput` if the payload is empty
    /// - `UnsupportedFileType` if extension checking is on and the filename
    ///   is not jpg/jpeg/png (no decode is attempted)
    /// - `InvalidImageFormat` if the bytes do not decode as an image
    pub fn validate(&self, input: &ImageInput) -> Result<DynamicImage, ExtractError> {
        if input.is_empty() {
            return Err(ExtractError::MissingInput);
        }

        if self.config.check_extension {
            if let Some(ref filename) = input.filename {
                validate_extension(filename)?;
            }
        }

        let (image, info) = decode_image_bytes_with_limit(&input.bytes, self.config.max_image_bytes)?;

        debug!(
            "Decoded image: {}x{}, {:?}, {} bytes",
            info.width, info.height, info.format, info.size_bytes
        );

        Ok(image)
    }

    /// Validate, preprocess and embed one image
    pub fn extract(&self, input: &ImageInput) -> Result<FeatureVector, ExtractError> {
        let image = self.validate(input)?;
        self.extract_image(&image)
    }

    /// Preprocess and embed an already decoded image
    pub fn extract_image(&self, image: &DynamicImage) -> Result<FeatureVector, ExtractError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ExtractError::InvalidImageFormat(
                "image has zero width or height".to_string(),
            ));
        }

        let tensor = preprocess(image, &self.config.preprocess);

        let values = self.encoder.embed(&tensor).map_err(|e| {
            warn!("Feature encoder failed: {:#}", e);
            ExtractError::inference(format!("{:#}", e))
        })?;

        let features = FeatureVector::new(values);

        if features.len() != self.encoder.dimension() {
            return Err(ExtractError::inference(format!(
                "encoder returned {} values, expected {}",
                features.len(),
                self.encoder.dimension()
            )));
        }

        if !features.all_finite() {
            return Err(ExtractError::inference(
                "encoder returned non-finite values",
            ));
        }

        Ok(features)
    }
}
