// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::Serialize;

use crate::catalog::SearchHit;

/// Success body for POST /search: `{"results": [...]}`
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Matching catalog items, highest similarity first
    pub results: Vec<SearchHit>,
}
