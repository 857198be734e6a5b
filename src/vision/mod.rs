// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for image feature extraction
//!
//! This module provides:
//! - Image decoding and validation (`image_utils`)
//! - Resizing and normalization into encoder input tensors (`preprocessing`)
//! - The pretrained CNN encoder seam and its ONNX Runtime backend (`encoder`)

pub mod encoder;
pub mod image_utils;
pub mod preprocessing;

pub use encoder::{pool_output, EncoderConfig, FeatureEncoder, OnnxFeatureEncoder};
pub use image_utils::{
    decode_image_bytes, decode_image_bytes_with_limit, detect_format, has_allowed_extension,
    ImageError, ImageInfo, ALLOWED_EXTENSIONS, MAX_IMAGE_SIZE,
};
pub use preprocessing::{
    preprocess, Normalization, PreprocessConfig, ResizeFilter, TensorLayout, INPUT_SIZE,
};
