//! Configuration module for Course-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and turns a validated configuration into the runtime scope, rewrite rules and
//! extraction settings.
//!
//! # Example
//!
//! ```no_run
//! use course_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Units selected: {}", config.units.len());
//! ```

mod parser;
mod runtime;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ExtractSection, FetchConfig, HostFixEntry, MirrorConfig, PathSegmentEntry,
    RewriteSection, ScopeSection, SelectionConfig, SelectionMode, UnitEntry,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_substitutions, parse_config,
};
