//! Course-Mirror: an offline mirror for hierarchical course sites
//!
//! This crate mirrors a remote tree of course pages to local storage. Every link that
//! points into the mirrored tree is rewritten to a relative path, links outside the
//! tree stay absolute, and excluded links (restricted areas, script links) are left
//! alone and never fetched.

pub mod config;
pub mod fetch;
pub mod mirror;
pub mod page;
pub mod progress;
pub mod report;
pub mod url;

use thiserror::Error;

/// Main error type for Course-Mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("Page session error: {0}")]
    Session(#[from] page::SessionError),

    #[error("Extraction failed for unit '{unit}': {source}")]
    Extraction {
        unit: String,
        source: page::SessionError,
    },

    #[error("No fetchable links found on unit '{unit}'")]
    NoFetchableLinks { unit: String },

    #[error("Unit '{unit}' is blocked")]
    Blocked { unit: String },

    #[error("No units selected for mirroring")]
    NoUnits,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Unsupported extraction config version {0}")]
    UnsupportedVersion(u32),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("Path segment cannot be mapped to a local file: {0}")]
    UnsafeSegment(String),
}

/// Result type alias for Course-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use mirror::Coordinator;
pub use crate::url::{classify, normalize, relative_path, Disposition, RewriteRule, ScopeConfig};
