// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Visual similarity search endpoint module
//!
//! Provides POST /search: extract features from an uploaded image and rank
//! the loaded catalog by cosine similarity.

pub mod handler;
pub mod response;

pub use handler::search_handler;
pub use response::SearchResponse;
