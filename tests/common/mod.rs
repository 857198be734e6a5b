// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures: a model-free encoder, image bytes and multipart bodies
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use image_embed_node::{
    api::AppState,
    extractor::{ExtractorConfig, FeatureExtractor},
    vision::FeatureEncoder,
};
use ndarray::{Array4, Axis};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const BOUNDARY: &str = "----imageEmbedTestBoundary";

/// Per-channel mean of an NHWC tensor: 3 deterministic values per image
pub struct ChannelMeanEncoder;

impl FeatureEncoder for ChannelMeanEncoder {
    fn model_name(&self) -> &str {
        "channel-mean"
    }

    fn dimension(&self) -> usize {
        3
    }

    fn embed(&self, input: &Array4<f32>) -> anyhow::Result<Vec<f32>> {
        let sample = input.index_axis(Axis(0), 0);
        let means = sample
            .mean_axis(Axis(0))
            .and_then(|rows| rows.mean_axis(Axis(0)))
            .ok_or_else(|| anyhow::anyhow!("empty tensor"))?;
        Ok(means.to_vec())
    }
}

pub struct FailingEncoder;

impl FeatureEncoder for FailingEncoder {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> usize {
        3
    }

    fn embed(&self, _input: &Array4<f32>) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("ONNX session crashed on node Conv_42")
    }
}

/// Panics on its first call, then behaves like [`ChannelMeanEncoder`]
#[derive(Default)]
pub struct PanicOnceEncoder {
    tripped: AtomicBool,
}

impl FeatureEncoder for PanicOnceEncoder {
    fn model_name(&self) -> &str {
        "panic-once"
    }

    fn dimension(&self) -> usize {
        3
    }

    fn embed(&self, input: &Array4<f32>) -> anyhow::Result<Vec<f32>> {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            panic!("encoder blew up mid-run");
        }
        ChannelMeanEncoder.embed(input)
    }
}

pub fn panic_once_extractor() -> Arc<FeatureExtractor> {
    Arc::new(FeatureExtractor::new(
        Arc::new(PanicOnceEncoder::default()),
        ExtractorConfig::default(),
    ))
}

pub fn extractor(config: ExtractorConfig) -> Arc<FeatureExtractor> {
    Arc::new(FeatureExtractor::new(Arc::new(ChannelMeanEncoder), config))
}

pub fn test_state() -> AppState {
    AppState::new(extractor(ExtractorConfig::default()))
}

pub fn failing_state() -> AppState {
    AppState::new(Arc::new(FeatureExtractor::new(
        Arc::new(FailingEncoder),
        ExtractorConfig::default(),
    )))
}

pub fn encode(width: u32, height: u32, color: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode test image");
    buf
}

pub fn jpeg_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(width, height, color, ImageFormat::Jpeg)
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(width, height, color, ImageFormat::Png)
}

/// Build a multipart/form-data body with a single file field
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(uri: &str, field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, filename, "application/octet-stream", data)))
        .expect("build request")
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
