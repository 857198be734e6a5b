// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Catalog of precomputed feature vectors for visual similarity search
//!
//! The catalog file is a JSON array of items. Each item carries an `id`, an
//! optional `name`, an optional `features` vector produced by the same encoder,
//! and any number of extra display fields (category, price, image URL, ...)
//! that are passed through to search results untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default minimum similarity, as a fraction of 1.0
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// Default number of results returned by a search
pub const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Null when the entry has no id
    #[serde(default)]
    pub id: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing)]
    pub features: Option<Vec<f32>>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// One scored catalog item; similarity is a percentage (0-100)
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub similarity: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Load a catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&raw).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        info!(
            "Loaded catalog with {} items ({} with features) from {}",
            catalog.len(),
            catalog.items.iter().filter(|i| i.features.is_some()).count(),
            path.display()
        );

        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rank catalog items against a query vector
    ///
    /// Keeps items whose similarity is at least `threshold * 100`, sorted
    /// highest first, truncated to `limit`. Items without features or with a
    /// vector of a different length are skipped.
    pub fn search(&self, query: &[f32], threshold: f32, limit: usize) -> Vec<SearchHit> {
        let cutoff = threshold * 100.0;

        let mut hits: Vec<SearchHit> = self
            .items
            .iter()
            .filter_map(|item| {
                let features = match item.features.as_deref() {
                    Some(features) => features,
                    None => {
                        warn!("Catalog item {} does not have features", item.id);
                        return None;
                    }
                };
                if features.len() != query.len() {
                    warn!(
                        "Catalog item {} has {} features, query has {}",
                        item.id,
                        features.len(),
                        query.len()
                    );
                    return None;
                }

                let similarity = cosine_similarity(query, features) * 100.0;
                debug!("Similarity for item {}: {:.2}", item.id, similarity);

                (similarity >= cutoff).then(|| SearchHit {
                    item: item.clone(),
                    similarity,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        hits.truncate(limit);
        hits
    }
}

/// Cosine similarity between two vectors
///
/// Returns 0.0 for mismatched lengths, empty input or a zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
