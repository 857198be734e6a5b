// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the image embedding node

/// Semantic version number
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-11-02";

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Image Embed Node {} ({})", VERSION, BUILD_DATE)
}
