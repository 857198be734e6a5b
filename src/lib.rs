// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod extractor;
pub mod logging;
pub mod version;
pub mod vision;

pub use catalog::{Catalog, CatalogItem, SearchHit};
pub use config::NodeConfig;
pub use extractor::{ExtractError, ExtractorConfig, FeatureExtractor, FeatureVector, ImageInput};
pub use vision::{FeatureEncoder, OnnxFeatureEncoder};
