// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Environment driven configuration for the feature extraction node

use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::catalog::{DEFAULT_LIMIT, DEFAULT_THRESHOLD};
use crate::extractor::ExtractorConfig;
use crate::vision::{EncoderConfig, PreprocessConfig, MAX_IMAGE_SIZE};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;

/// Similarity search settings for `POST /search`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Minimum similarity as a fraction (0.7 keeps items scoring 70% or more)
    pub threshold: f32,
    /// Maximum number of results
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Full node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub encoder: EncoderConfig,
    pub extractor: ExtractorConfig,
    pub catalog_path: Option<PathBuf>,
    pub search: SearchConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            encoder: EncoderConfig::default(),
            extractor: ExtractorConfig::default(),
            catalog_path: None,
            search: SearchConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    ///
    /// Unset variables take their defaults; set but unparsable variables are
    /// an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let encoder_defaults = defaults.encoder.clone();
        let layout = parse_or(&get, "TENSOR_LAYOUT", encoder_defaults.layout)?;

        let encoder = EncoderConfig {
            name: get("MODEL_NAME").unwrap_or(encoder_defaults.name),
            model_path: get("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(encoder_defaults.model_path),
            layout,
            intra_threads: parse_or(&get, "INTRA_THREADS", encoder_defaults.intra_threads)?,
            use_gpu: parse_bool_or(&get, "USE_GPU", encoder_defaults.use_gpu)?,
        };

        let preprocess = PreprocessConfig {
            layout,
            normalization: parse_or(&get, "NORMALIZATION", defaults.extractor.preprocess.normalization)?,
            filter: parse_or(&get, "RESIZE_FILTER", defaults.extractor.preprocess.filter)?,
        };

        let extractor = ExtractorConfig {
            preprocess,
            check_extension: parse_bool_or(&get, "CHECK_EXTENSION", defaults.extractor.check_extension)?,
            max_image_bytes: parse_or(&get, "MAX_IMAGE_BYTES", MAX_IMAGE_SIZE)?,
        };

        let search = SearchConfig {
            threshold: parse_or(&get, "SEARCH_THRESHOLD", defaults.search.threshold)?,
            limit: parse_or(&get, "SEARCH_LIMIT", defaults.search.limit)?,
        };

        if !(0.0..=1.0).contains(&search.threshold) {
            return Err(anyhow!(
                "SEARCH_THRESHOLD must be between 0.0 and 1.0, got {}",
                search.threshold
            ));
        }

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            encoder,
            extractor,
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            search,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value for {}: '{}' ({})", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_bool_or<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow!("Invalid value for {}: '{}' (expected true or false)", key, raw)),
        },
        None => Ok(default),
    }
}
