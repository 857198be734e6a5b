// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod extract;
pub mod health;
pub mod http_server;
pub mod multipart;
pub mod search;

pub use errors::{ApiError, ErrorResponse};
pub use extract::{extract_handler, run_extraction, ExtractResponse};
pub use health::HealthResponse;
pub use http_server::{create_app, start_server, AppState};
pub use search::{search_handler, SearchResponse};
