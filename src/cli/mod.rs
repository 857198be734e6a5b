// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! One-shot command line adapter: `image-embed-cli <image-path>`
//!
//! Exactly one JSON document is written to stdout, either
//! `{"features": [...]}` (exit 0) or `{"error": "..."}` (exit 1).

use clap::builder::BoolishValueParser;
use clap::error::ErrorKind;
use clap::{ArgAction, Args, Parser};
use std::ffi::OsString;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::api::{ErrorResponse, ExtractResponse};
use crate::extractor::{ExtractError, ExtractorConfig, FeatureExtractor, FeatureVector, ImageInput};
use crate::vision::{
    EncoderConfig, Normalization, OnnxFeatureEncoder, PreprocessConfig, ResizeFilter,
    TensorLayout, MAX_IMAGE_SIZE,
};

pub const USAGE_MESSAGE: &str = "Usage: image-embed-cli <image-path>";

/// Extract a feature vector from one image file
#[derive(Parser, Debug)]
#[command(name = "image-embed-cli")]
#[command(version)]
#[command(about = "Print the CNN feature vector of an image as JSON", long_about = None)]
pub struct Cli {
    /// Path to a jpg/jpeg/png image
    pub image: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Model and preprocessing options, shared with the server's environment
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// ONNX feature encoder
    #[arg(long, env = "MODEL_PATH", default_value = "./models/resnet50-pooled.onnx")]
    pub model_path: PathBuf,

    #[arg(long, env = "MODEL_NAME", default_value = "resnet50")]
    pub model_name: String,

    /// Input tensor layout (nhwc, nchw)
    #[arg(long, env = "TENSOR_LAYOUT", default_value = "nhwc")]
    pub layout: TensorLayout,

    /// Pixel normalization (caffe, torch, clip)
    #[arg(long, env = "NORMALIZATION", default_value = "caffe")]
    pub normalization: Normalization,

    /// Resize filter (nearest, triangle, catmullrom, lanczos3)
    #[arg(long, env = "RESIZE_FILTER", default_value = "nearest")]
    pub resize_filter: ResizeFilter,

    #[arg(long, env = "INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Try the CUDA execution provider first
    #[arg(
        long,
        env = "USE_GPU",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub use_gpu: bool,

    /// Reject files whose extension is not jpg, jpeg or png
    #[arg(
        long,
        env = "CHECK_EXTENSION",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub check_extension: bool,

    #[arg(long, env = "MAX_IMAGE_BYTES", default_value_t = MAX_IMAGE_SIZE)]
    pub max_image_bytes: usize,
}

impl ModelArgs {
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            name: self.model_name.clone(),
            model_path: self.model_path.clone(),
            layout: self.layout,
            intra_threads: self.intra_threads,
            use_gpu: self.use_gpu,
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            preprocess: PreprocessConfig {
                layout: self.layout,
                normalization: self.normalization,
                filter: self.resize_filter,
            },
            check_extension: self.check_extension,
            max_image_bytes: self.max_image_bytes,
        }
    }
}

/// What the process prints and how it exits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutput {
    pub body: String,
    pub exit_code: i32,
}

impl CliOutput {
    pub fn success(features: FeatureVector) -> Self {
        Self {
            body: to_json(&ExtractResponse { features }),
            exit_code: 0,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            body: to_json(&ErrorResponse::new(message)),
            exit_code: 1,
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!(r#"{{"error":"Failed to serialize output: {}"}}"#, e))
}

/// Why argument parsing did not produce a [`Cli`]
#[derive(Debug)]
pub enum ParseExit {
    /// `--help` or `--version`: let clap print it and exit 0
    Display(clap::Error),
    /// Wrong arguments or option values: print the JSON error and exit 1
    Usage(CliOutput),
}

/// Parse arguments, turning usage errors into a JSON failure
///
/// A bad option value is reported as such; anything else (missing path,
/// extra arguments, unknown flags) gets the usage line.
pub fn parse_args<I, T>(args: I) -> Result<Cli, ParseExit>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|err| {
        if !err.use_stderr() {
            return ParseExit::Display(err);
        }

        debug!("Argument error: {}", err);
        let output = match err.kind() {
            ErrorKind::InvalidValue | ErrorKind::ValueValidation => {
                CliOutput::failure(clap_message(&err))
            }
            _ => CliOutput::failure(USAGE_MESSAGE),
        };
        ParseExit::Usage(output)
    })
}

/// First line of a clap error without its `error: ` prefix
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered.lines().next().unwrap_or_default().trim();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

/// Read an image file into an [`ImageInput`]
///
/// A nonexistent or unreadable path is a `MissingInput`.
pub fn read_image(path: &Path) -> Result<ImageInput, ExtractError> {
    if !path.is_file() {
        warn!("Image path is not a readable file: {}", path.display());
        return Err(ExtractError::MissingInput);
    }

    let bytes = std::fs::read(path).map_err(|e| {
        warn!("Failed to read {}: {}", path.display(), e);
        ExtractError::MissingInput
    })?;

    Ok(ImageInput::from_path_bytes(path, bytes))
}

/// Run the pipeline on one file with an already built extractor
pub fn extract_path(extractor: &FeatureExtractor, path: &Path) -> CliOutput {
    let result = read_image(path).and_then(|input| {
        panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(&input))).unwrap_or_else(|_| {
            Err(ExtractError::inference("feature extraction panicked"))
        })
    });

    match result {
        Ok(features) => CliOutput::success(features),
        Err(err) => {
            if let ExtractError::InferenceFailure(ref detail) = err {
                error!("Feature extraction failed for {}: {}", path.display(), detail);
            }
            CliOutput::failure(err.public_message())
        }
    }
}

fn build_extractor(args: &ModelArgs) -> anyhow::Result<FeatureExtractor> {
    let encoder = OnnxFeatureEncoder::load(&args.encoder_config())?;
    Ok(FeatureExtractor::new(Arc::new(encoder), args.extractor_config()))
}

/// Execute the CLI: load the encoder, then extract
pub fn execute(cli: Cli) -> CliOutput {
    // An unreadable image fails fast without paying for model load
    if !cli.image.is_file() {
        warn!("Image path is not a readable file: {}", cli.image.display());
        return CliOutput::failure(ExtractError::MissingInput.public_message());
    }

    match build_extractor(&cli.model) {
        Ok(extractor) => extract_path(&extractor, &cli.image),
        Err(e) => {
            error!("Failed to load feature encoder: {:#}", e);
            CliOutput::failure(format!("{:#}", e))
        }
    }
}
