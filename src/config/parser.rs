use crate::config::types::Config;
use crate::config::validation::validate;
use crate::page::TextSubstitutions;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use course_mirror::config::load_config;
///
/// let config = load_config(Path::new("mirror.toml")).unwrap();
/// println!("Mirroring into: {}", config.mirror.root);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads a standalone substitutions file: a flat TOML table of text → replacement
pub fn load_substitutions(path: &Path) -> Result<TextSubstitutions, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let map: BTreeMap<String, String> = toml::from_str(&content)?;
    Ok(TextSubstitutions::new(map))
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the config they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
