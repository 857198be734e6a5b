// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pretrained CNN feature encoder
//!
//! The encoder is an ImageNet classifier exported to ONNX with its
//! classification head removed. It maps one preprocessed image to a pooled,
//! fixed-length feature vector (2048 values for ResNet50).

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayViewD, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::preprocessing::{input_shape, TensorLayout};

/// Opaque `embed(tensor) -> vector` collaborator
///
/// Implementations must be safe to call from many request handlers at once.
pub trait FeatureEncoder: Send + Sync {
    /// Name reported to clients
    fn model_name(&self) -> &str;

    /// Length of every vector returned by `embed`
    fn dimension(&self) -> usize;

    /// Run a `[1, ...]` batch through the model and return the pooled vector
    /// for batch element 0
    fn embed(&self, input: &Array4<f32>) -> Result<Vec<f32>>;
}

/// Settings for loading an ONNX feature encoder
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Model name (e.g., "resnet50")
    pub name: String,
    /// Path to the ONNX model file
    pub model_path: PathBuf,
    /// Layout of the model's input tensor
    pub layout: TensorLayout,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
    /// Try the CUDA execution provider before falling back to CPU
    pub use_gpu: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            name: "resnet50".to_string(),
            model_path: PathBuf::from("./models/resnet50-pooled.onnx"),
            layout: TensorLayout::Nhwc,
            intra_threads: 4,
            use_gpu: false,
        }
    }
}

/// ONNX Runtime backed feature encoder
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex
/// and concurrent requests are serialized through it.
pub struct OnnxFeatureEncoder {
    session: Mutex<Session>,
    name: String,
    input_name: String,
    layout: TensorLayout,
    dimension: usize,
}

impl std::fmt::Debug for OnnxFeatureEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxFeatureEncoder")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("layout", &self.layout)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxFeatureEncoder {
    /// Load the encoder and probe its output dimension
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - The probe inference fails or yields an unusable output shape
    pub fn load(config: &EncoderConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();

        if !model_path.exists() {
            anyhow::bail!("Feature encoder model not found: {}", model_path.display());
        }

        info!(
            "Loading feature encoder '{}' from {}",
            config.name,
            model_path.display()
        );

        let mut session = if config.use_gpu {
            match build_session(model_path, config.intra_threads, true) {
                Ok(session) => {
                    info!("✅ CUDA execution provider initialized");
                    session
                }
                Err(e) => {
                    warn!("⚠️  CUDA execution provider failed: {}", e);
                    warn!("   Falling back to CPU execution provider");
                    build_session(model_path, config.intra_threads, false)?
                }
            }
        } else {
            build_session(model_path, config.intra_threads, false)?
        };

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "input_1".to_string());

        // Probe with a zero image so a mismatched layout or a model that still
        // has its classification head fails at startup instead of per request
        let dimension = {
            let probe = Array4::<f32>::zeros(input_shape(config.layout));
            let features = run_session(&mut session, &input_name, &probe, config.layout)
                .context("Feature encoder probe inference failed")?;
            features.len()
        };

        if dimension == 0 {
            anyhow::bail!("Feature encoder produced an empty output vector");
        }

        info!(
            "✅ Feature encoder loaded (input: {}, layout: {}, {}D features)",
            input_name, config.layout, dimension
        );

        Ok(Self {
            session: Mutex::new(session),
            name: config.name.clone(),
            input_name,
            layout: config.layout,
            dimension,
        })
    }
}

impl FeatureEncoder for OnnxFeatureEncoder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let expected = input_shape(self.layout);
        if input.dim() != expected {
            anyhow::bail!(
                "Invalid input shape: {:?}, expected {:?}",
                input.shape(),
                expected
            );
        }

        let mut session = lock_session(&self.session);
        run_session(&mut session, &self.input_name, input, self.layout)
    }
}

/// Acquire the session even if an earlier run panicked while holding it
///
/// `Session::run` keeps no state between calls, so a poisoned lock still
/// guards a usable session.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(|poisoned| {
        warn!("Feature encoder session lock was poisoned by a panicked run; recovering");
        poisoned.into_inner()
    })
}

fn build_session(model_path: &Path, intra_threads: usize, cuda: bool) -> Result<Session> {
    let builder = Session::builder().context("Failed to create session builder")?;

    let builder = if cuda {
        builder
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
    } else {
        builder
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
    };

    builder
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!(
            "Failed to load feature encoder model from {}",
            model_path.display()
        ))
}

fn run_session(
    session: &mut Session,
    input_name: &str,
    input: &Array4<f32>,
    layout: TensorLayout,
) -> Result<Vec<f32>> {
    let input_value =
        Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

    let outputs = session
        .run(ort::inputs![input_name => input_value])
        .context("Encoder inference failed")?;

    let output = outputs[0]
        .try_extract_array::<f32>()
        .context("Failed to extract output tensor")?;

    debug!("Encoder output shape: {:?}", output.shape());

    pool_output(output, layout)
}

/// Reduce the encoder output for batch element 0 to a flat feature vector
///
/// Expected shapes:
/// - `[batch, dim]` - already pooled, take row 0
/// - `[batch, H, W, C]` (NHWC) or `[batch, C, H, W]` (NCHW) - average over the
///   spatial axes
pub fn pool_output(output: ArrayViewD<'_, f32>, layout: TensorLayout) -> Result<Vec<f32>> {
    let shape = output.shape().to_vec();

    if shape.first().copied().unwrap_or(0) == 0 {
        anyhow::bail!("Encoder returned an empty batch: {:?}", shape);
    }

    let sample = output.index_axis(Axis(0), 0);

    match shape.len() {
        2 => Ok(sample.iter().copied().collect()),
        4 => {
            let (first, second) = match layout {
                // [H, W, C]: average H then W
                TensorLayout::Nhwc => (Axis(0), Axis(0)),
                // [C, H, W]: average W then H
                TensorLayout::Nchw => (Axis(2), Axis(1)),
            };
            let pooled = sample
                .mean_axis(first)
                .and_then(|partial| partial.mean_axis(second))
                .ok_or_else(|| anyhow::anyhow!("Encoder output has empty spatial axes: {:?}", shape))?;
            Ok(pooled.iter().copied().collect())
        }
        _ => anyhow::bail!(
            "Unexpected encoder output shape: {:?}, expected [batch, dim] or a 4D feature map",
            shape
        ),
    }
}
