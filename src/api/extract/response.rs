// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

use crate::extractor::FeatureVector;

/// Success body for POST /extract and the CLI: `{"features": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractResponse {
    pub features: FeatureVector,
}

impl ExtractResponse {
    pub fn new(features: FeatureVector) -> Self {
        Self { features }
    }
}
