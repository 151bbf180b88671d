use crate::config::types::{Config, FetchConfig, MirrorConfig, RewriteSection, UnitEntry};
use crate::page::parse_sentinel;
use crate::url::{HostFix, PathSegmentRewrite, ScopeConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_mirror_config(&config.mirror)?;
    ScopeConfig::new(
        &config.scope.allowed_hosts,
        &config.scope.allowed_path_prefixes,
        &config.scope.excluded_prefixes,
    )?;
    validate_excluded_prefixes(&config.scope.excluded_prefixes)?;
    validate_rewrite(&config.rewrite)?;
    validate_fetch_config(&config.fetch)?;
    if let Some(sentinel) = &config.extract.blocked_sentinel {
        parse_sentinel(sentinel)?;
    }
    validate_subtree(&config.selection.subtree)?;
    validate_units(&config.units)?;
    Ok(())
}

/// Validates mirror output configuration
fn validate_mirror_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    if config.root.is_empty() {
        return Err(ConfigError::Validation("mirror root cannot be empty".to_string()));
    }

    if config.tree_root.contains('/') {
        return Err(ConfigError::Validation(format!(
            "tree-root must be a single path segment, got '{}'",
            config.tree_root
        )));
    }

    Ok(())
}

/// Excluded prefixes are compared against full URLs, so they must be absolute
fn validate_excluded_prefixes(prefixes: &[String]) -> Result<(), ConfigError> {
    for prefix in prefixes {
        Url::parse(prefix).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid excluded prefix '{}': {}", prefix, e))
        })?;
    }
    Ok(())
}

fn validate_rewrite(config: &RewriteSection) -> Result<(), ConfigError> {
    if let Some(fix) = &config.host_fix {
        HostFix::new(&fix.from, &fix.to)?;
    }
    if let Some(seg) = &config.path_segment {
        PathSegmentRewrite::new(&seg.anchor, &seg.prefix, &seg.digits)?;
    }
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be greater than 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_subtree(subtree: &str) -> Result<(), ConfigError> {
    if subtree.split('/').any(|s| s == "..") || subtree.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "selection subtree must be a relative path inside the mirror root, got '{}'",
            subtree
        )));
    }
    Ok(())
}

/// Validates unit entries: labels unique and non-empty, URLs absolute HTTP(S)
fn validate_units(units: &[UnitEntry]) -> Result<(), ConfigError> {
    let mut labels = HashSet::new();

    for unit in units {
        if unit.label.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "unit with URL '{}' has an empty label",
                unit.url
            )));
        }

        if !labels.insert(unit.label.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate unit label '{}'",
                unit.label
            )));
        }

        let url = Url::parse(&unit.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid unit URL '{}': {}", unit.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Unit URL '{}' must use HTTP or HTTPS",
                unit.url
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(label: &str, url: &str) -> UnitEntry {
        UnitEntry {
            label: label.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_validate_units() {
        assert!(validate_units(&[unit("A", "https://c.example.edu/a/")]).is_ok());
        assert!(validate_units(&[unit("", "https://c.example.edu/a/")]).is_err());
        assert!(validate_units(&[unit("A", "ftp://c.example.edu/a/")]).is_err());
        assert!(validate_units(&[unit("A", "not a url")]).is_err());
        assert!(validate_units(&[
            unit("A", "https://c.example.edu/a/"),
            unit("A", "https://c.example.edu/b/"),
        ])
        .is_err());
    }

    #[test]
    fn test_validate_subtree() {
        assert!(validate_subtree("").is_ok());
        assert!(validate_subtree("2425").is_ok());
        assert!(validate_subtree("2425/maths").is_ok());
        assert!(validate_subtree("../elsewhere").is_err());
        assert!(validate_subtree("/abs").is_err());
    }

    #[test]
    fn test_validate_excluded_prefixes() {
        assert!(validate_excluded_prefixes(&["https://c.example.edu/staff".to_string()]).is_ok());
        assert!(validate_excluded_prefixes(&["/staff".to_string()]).is_err());
    }

    #[test]
    fn test_validate_mirror_config() {
        let ok = MirrorConfig {
            root: "./mirror".to_string(),
            tree_root: "course_builder".to_string(),
        };
        assert!(validate_mirror_config(&ok).is_ok());

        let nested = MirrorConfig {
            root: "./mirror".to_string(),
            tree_root: "a/b".to_string(),
        };
        assert!(validate_mirror_config(&nested).is_err());
    }
}
