//! Fetch module for downloading mirror resources
//!
//! This module contains:
//! - HTTP client construction and atomic file writes
//! - The per-unit fetch pipeline with skip-if-present semantics

mod fetcher;
mod pipeline;

pub use fetcher::{build_http_client, download_to, write_atomic, FetchError, DEFAULT_TIMEOUT};
pub use pipeline::{FetchPipeline, FetchResult, FetchStatus, FetchSummary};
