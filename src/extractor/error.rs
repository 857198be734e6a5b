// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

use crate::vision::ImageError;

/// Message returned to clients for failures inside preprocessing or inference.
/// The detailed cause is only logged.
pub const GENERIC_FAILURE_MESSAGE: &str = "Error processing image";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("No image file provided")]
    MissingInput,

    #[error("Unsupported file type: '{0}'. Allowed types: jpg, jpeg, png")]
    UnsupportedFileType(String),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),

    #[error("Feature extraction failed: {0}")]
    InferenceFailure(String),
}

impl ExtractError {
    /// Whether the caller is at fault (bad or missing input)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ExtractError::InferenceFailure(_))
    }

    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    /// Message safe to hand back to a client
    pub fn public_message(&self) -> String {
        match self {
            ExtractError::InferenceFailure(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn inference(err: impl std::fmt::Display) -> Self {
        ExtractError::InferenceFailure(err.to_string())
    }
}

impl From<ImageError> for ExtractError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::EmptyData => ExtractError::MissingInput,
            other => ExtractError::InvalidImageFormat(other.to_string()),
        }
    }
}
