// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Feature extraction endpoint module
//!
//! Provides POST /extract for turning an uploaded image into its feature vector.

pub mod handler;
pub mod response;

pub use handler::{extract_handler, run_extraction};
pub use response::ExtractResponse;
