// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the feature encoder
//!
//! The encoder only produces meaningful embeddings when its input matches the
//! preprocessing convention it was trained with. Three conventions are
//! supported:
//! - `Caffe`: Keras ResNet50 `preprocess_input` (BGR, mean subtraction, no scaling)
//! - `Torch`: torchvision ImageNet (`pixel/255`, mean/std, RGB)
//! - `Clip`: CLIP mean/std (`pixel/255`, RGB)

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use std::fmt;
use std::str::FromStr;

/// Target size for the encoder input (224x224)
pub const INPUT_SIZE: u32 = 224;

/// Number of colour channels fed to the encoder
pub const CHANNELS: usize = 3;

/// ImageNet channel means in BGR order, on the 0-255 scale (Keras "caffe" mode)
pub const CAFFE_MEAN_BGR: [f32; 3] = [103.939, 116.779, 123.68];

/// ImageNet normalization mean values (RGB, 0-1 scale)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet normalization std values
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// CLIP normalization mean values
pub const CLIP_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];

/// CLIP normalization std values
pub const CLIP_STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

/// Memory layout of the input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[1, H, W, C]` - Keras / TensorFlow exports
    #[default]
    Nhwc,
    /// `[1, C, H, W]` - PyTorch exports
    Nchw,
}

/// Pixel normalization convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    #[default]
    Caffe,
    Torch,
    Clip,
}

/// Resampling filter used when resizing to the input size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    /// Matches Keras `load_img(target_size=...)`
    #[default]
    Nearest,
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl ResizeFilter {
    fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Preprocessing settings for one encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreprocessConfig {
    pub layout: TensorLayout,
    pub normalization: Normalization,
    pub filter: ResizeFilter,
}

impl Normalization {
    /// Normalize one RGB pixel, returning channel values in the order the
    /// model expects (BGR for `Caffe`, RGB otherwise)
    pub fn apply(self, rgb: [u8; 3]) -> [f32; 3] {
        let [r, g, b] = rgb.map(f32::from);
        match self {
            Normalization::Caffe => [
                b - CAFFE_MEAN_BGR[0],
                g - CAFFE_MEAN_BGR[1],
                r - CAFFE_MEAN_BGR[2],
            ],
            Normalization::Torch => scale_and_standardize([r, g, b], IMAGENET_MEAN, IMAGENET_STD),
            Normalization::Clip => scale_and_standardize([r, g, b], CLIP_MEAN, CLIP_STD),
        }
    }
}

fn scale_and_standardize(rgb: [f32; 3], mean: [f32; 3], std: [f32; 3]) -> [f32; 3] {
    [
        (rgb[0] / 255.0 - mean[0]) / std[0],
        (rgb[1] / 255.0 - mean[1]) / std[1],
        (rgb[2] / 255.0 - mean[2]) / std[2],
    ]
}

/// Shape of a single-image input tensor for the given layout
pub fn input_shape(layout: TensorLayout) -> (usize, usize, usize, usize) {
    let size = INPUT_SIZE as usize;
    match layout {
        TensorLayout::Nhwc => (1, size, size, CHANNELS),
        TensorLayout::Nchw => (1, CHANNELS, size, size),
    }
}

/// Resize an image to exactly `INPUT_SIZE` x `INPUT_SIZE` RGB
pub fn resize_for_encoder(image: &DynamicImage, filter: ResizeFilter) -> DynamicImage {
    if image.width() == INPUT_SIZE && image.height() == INPUT_SIZE {
        return DynamicImage::ImageRgb8(image.to_rgb8());
    }
    let resized = image.resize_exact(INPUT_SIZE, INPUT_SIZE, filter.filter_type());
    DynamicImage::ImageRgb8(resized.to_rgb8())
}

/// Preprocess an image into a batch-of-one tensor
///
/// Steps:
/// 1. Resize to INPUT_SIZE x INPUT_SIZE and drop any alpha channel
/// 2. Normalize each pixel per `config.normalization`
/// 3. Lay out as `[1, H, W, C]` or `[1, C, H, W]`
pub fn preprocess(image: &DynamicImage, config: &PreprocessConfig) -> Array4<f32> {
    let rgb = resize_for_encoder(image, config.filter).to_rgb8();
    let mut tensor = Array4::zeros(input_shape(config.layout));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        let values = config.normalization.apply(pixel.0);
        for (c, value) in values.into_iter().enumerate() {
            match config.layout {
                TensorLayout::Nhwc => tensor[[0, y, x, c]] = value,
                TensorLayout::Nchw => tensor[[0, c, y, x]] = value,
            }
        }
    }

    tensor
}

impl FromStr for TensorLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nhwc" | "channels_last" => Ok(Self::Nhwc),
            "nchw" | "channels_first" => Ok(Self::Nchw),
            other => Err(format!("unknown tensor layout '{}', expected nhwc or nchw", other)),
        }
    }
}

impl FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caffe" => Ok(Self::Caffe),
            "torch" | "imagenet" => Ok(Self::Torch),
            "clip" => Ok(Self::Clip),
            other => Err(format!(
                "unknown normalization '{}', expected caffe, torch or clip",
                other
            )),
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "bilinear" => Ok(Self::Triangle),
            "catmullrom" | "bicubic" => Ok(Self::CatmullRom),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            other => Err(format!(
                "unknown resize filter '{}', expected nearest, triangle, catmullrom or lanczos3",
                other
            )),
        }
    }
}

impl fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorLayout::Nhwc => write!(f, "nhwc"),
            TensorLayout::Nchw => write!(f, "nchw"),
        }
    }
}
