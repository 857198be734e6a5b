// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX feature encoder tests
//!
//! Tests that need the real model are ignored by default. Export a pooled
//! ResNet50 to `./models/resnet50-pooled.onnx` (or set MODEL_PATH) and run
//! with `--ignored`.

use image_embed_node::{
    catalog::cosine_similarity,
    extractor::{ExtractorConfig, FeatureExtractor, ImageInput},
    vision::{EncoderConfig, FeatureEncoder, OnnxFeatureEncoder},
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::{jpeg_bytes, png_bytes};

fn model_path() -> PathBuf {
    std::env::var("MODEL_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./models/resnet50-pooled.onnx"))
}

#[test]
fn test_missing_model_fails_to_load() {
    let config = EncoderConfig {
        model_path: PathBuf::from("/nonexistent/resnet50.onnx"),
        ..Default::default()
    };
    let err = OnnxFeatureEncoder::load(&config).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/resnet50.onnx"));
}

#[test]
#[ignore] // Requires the ONNX model
fn test_resnet50_produces_2048_features() {
    let config = EncoderConfig {
        model_path: model_path(),
        ..Default::default()
    };
    let encoder = OnnxFeatureEncoder::load(&config).expect("Failed to load encoder");
    assert_eq!(encoder.dimension(), 2048);

    let extractor = FeatureExtractor::new(Arc::new(encoder), ExtractorConfig::default());
    let features = extractor
        .extract(&ImageInput::new(jpeg_bytes(500, 500, [180, 40, 40]), None))
        .unwrap();

    assert_eq!(features.len(), 2048);
    assert!(features.all_finite());
    // Post-ReLU average pooling
    assert!(features.as_slice().iter().all(|v| *v >= 0.0));
}

#[test]
#[ignore] // Requires the ONNX model
fn test_same_image_is_more_similar_than_different_image() {
    let config = EncoderConfig {
        model_path: model_path(),
        ..Default::default()
    };
    let encoder = OnnxFeatureEncoder::load(&config).expect("Failed to load encoder");
    let extractor = FeatureExtractor::new(Arc::new(encoder), ExtractorConfig::default());

    let red = png_bytes(224, 224, [200, 30, 30]);
    let a = extractor.extract(&ImageInput::new(red.clone(), None)).unwrap();
    let b = extractor.extract(&ImageInput::new(red, None)).unwrap();
    let c = extractor
        .extract(&ImageInput::new(png_bytes(224, 224, [30, 30, 200]), None))
        .unwrap();

    let same = cosine_similarity(a.as_slice(), b.as_slice());
    let different = cosine_similarity(a.as_slice(), c.as_slice());
    assert!((same - 1.0).abs() < 1e-4);
    assert!(same > different);
}
