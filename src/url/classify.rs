use crate::ConfigError;
use std::collections::BTreeSet;
use url::Url;

/// Which links belong to the mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeConfig {
    allowed_hosts: BTreeSet<String>,
    allowed_path_prefixes: Vec<String>,
    excluded_prefixes: Vec<String>,
}

impl ScopeConfig {
    /// Builds a scope; at least one allowed host and one path prefix are required
    pub fn new<H, P, E>(hosts: H, path_prefixes: P, excluded_prefixes: E) -> Result<Self, ConfigError>
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let allowed_hosts: BTreeSet<String> = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        if allowed_hosts.is_empty() {
            return Err(ConfigError::Validation(
                "scope must allow at least one host".to_string(),
            ));
        }

        let allowed_path_prefixes: Vec<String> = path_prefixes
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();

        if allowed_path_prefixes.is_empty() {
            return Err(ConfigError::Validation(
                "scope must allow at least one path prefix".to_string(),
            ));
        }

        if let Some(bad) = allowed_path_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Validation(format!(
                "allowed path prefix must start with '/', got '{}'",
                bad
            )));
        }

        let excluded_prefixes = excluded_prefixes
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(Self {
            allowed_hosts,
            allowed_path_prefixes,
            excluded_prefixes,
        })
    }

    pub fn allowed_hosts(&self) -> impl Iterator<Item = &str> {
        self.allowed_hosts.iter().map(String::as_str)
    }

    pub fn allowed_path_prefixes(&self) -> &[String] {
        &self.allowed_path_prefixes
    }

    pub fn excluded_prefixes(&self) -> &[String] {
        &self.excluded_prefixes
    }

    /// Returns true if the URL's host is one of the allowed hosts
    pub fn host_allowed(&self, url: &Url) -> bool {
        url.host_str()
            .map(|h| self.allowed_hosts.contains(&h.to_lowercase()))
            .unwrap_or(false)
    }

    /// Returns true if the URL's path falls under one of the allowed prefixes
    pub fn path_allowed(&self, url: &Url) -> bool {
        let path = url.path();
        self.allowed_path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Returns true if the URL falls under an excluded (restricted-access) prefix
    pub fn is_excluded(&self, url: &Url) -> bool {
        let s = url.as_str();
        self.excluded_prefixes
            .iter()
            .any(|prefix| s.starts_with(prefix.as_str()))
    }
}

/// Classification outcome for a discovered link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// In scope - downloaded and rewritten in the page
    Fetchable,
    /// Out of fetch scope - only its href is rewritten in the page
    RewriteOnly,
    /// Script link or excluded area - never fetched, href left alone
    Dropped,
}

impl Disposition {
    /// Returns true if the link should be downloaded
    pub fn should_fetch(&self) -> bool {
        matches!(self, Self::Fetchable)
    }

    /// Returns true if the link's href should be rewritten in the page
    pub fn should_rewrite(&self) -> bool {
        !matches!(self, Self::Dropped)
    }
}

/// Returns true for `javascript:` pseudo-links
pub fn is_script_link(raw_href: &str) -> bool {
    let trimmed = raw_href.trim_start();
    trimmed
        .get(..11)
        .map(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
        .unwrap_or(false)
}

/// Classifies a normalized link against the scope
///
/// Rules are applied in this order:
/// 1. Script pseudo-link → Dropped
/// 2. Excluded prefix → Dropped
/// 3. Host not allowed, or path outside the allowed prefixes → RewriteOnly
/// 4. Otherwise → Fetchable
///
/// Page extraction and the fetch pipeline both call this function, so the two
/// passes cannot disagree.
pub fn classify(url: &Url, raw_href: &str, scope: &ScopeConfig) -> Disposition {
    if is_script_link(raw_href) {
        return Disposition::Dropped;
    }

    if scope.is_excluded(url) {
        return Disposition::Dropped;
    }

    if !scope.host_allowed(url) || !scope.path_allowed(url) {
        return Disposition::RewriteOnly;
    }

    Disposition::Fetchable
}

/// Returns true if `url` should be referenced by a relative path from `page_url`
///
/// That is the case when the link is same-origin with the page and lies under one
/// of the mirrored path prefixes, whether or not its host is fetchable.
pub fn is_in_tree(url: &Url, page_url: &Url, scope: &ScopeConfig) -> bool {
    url.origin() == page_url.origin() && scope.path_allowed(url)
}
