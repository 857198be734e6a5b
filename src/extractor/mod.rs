// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feature extraction adapter shared by the HTTP and CLI front ends
//!
//! Flow per request: validate -> decode -> preprocess -> embed. Every step
//! reports failure through [`ExtractError`], which each transport maps to its
//! own status code or exit code.

pub mod error;
pub mod pipeline;
pub mod types;

pub use error::ExtractError;
pub use pipeline::{validate_extension, ExtractorConfig, FeatureExtractor};
pub use types::{FeatureVector, ImageInput};
