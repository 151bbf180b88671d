use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Course-Mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mirror: MirrorConfig,
    pub scope: ScopeSection,
    #[serde(default)]
    pub rewrite: RewriteSection,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extract: ExtractSection,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default, rename = "unit")]
    pub units: Vec<UnitEntry>,
    #[serde(default)]
    pub substitutions: BTreeMap<String, String>,
}

/// Where the mirror is written
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    /// Local directory the mirror is written under
    pub root: String,

    /// Leading URL path segment stripped from local paths
    #[serde(rename = "tree-root", default)]
    pub tree_root: String,
}

/// Which links belong to the mirror
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeSection {
    #[serde(rename = "allowed-hosts")]
    pub allowed_hosts: Vec<String>,

    #[serde(rename = "allowed-path-prefixes")]
    pub allowed_path_prefixes: Vec<String>,

    /// Absolute URL prefixes that are never fetched (e.g. staff-only areas)
    #[serde(rename = "excluded-prefixes", default)]
    pub excluded_prefixes: Vec<String>,
}

/// Host and path substitutions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RewriteSection {
    #[serde(rename = "host-fix")]
    pub host_fix: Option<HostFixEntry>,

    #[serde(rename = "path-segment")]
    pub path_segment: Option<PathSegmentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostFixEntry {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathSegmentEntry {
    /// Segment the year follows, e.g. "course_builder"
    pub anchor: String,

    /// Inserted before the digits, usually "" or "_"
    #[serde(default)]
    pub prefix: String,

    /// Four-digit replacement, e.g. "2425"
    pub digits: String,
}

/// Resource download configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Skip TLS certificate validation for the mirrored origin
    #[serde(rename = "accept-invalid-certs", default = "default_true")]
    pub accept_invalid_certs: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            accept_invalid_certs: true,
        }
    }
}

/// Page extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractSection {
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// CSS selector whose presence marks a unit as blocked
    #[serde(rename = "blocked-sentinel")]
    pub blocked_sentinel: Option<String>,
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            blocked_sentinel: None,
        }
    }
}

/// How the units were chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// The whole tree; failures are reported
    #[default]
    Tree,
    /// Hand-picked units; failures are only logged
    Picked,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub mode: SelectionMode,

    /// Directory under the mirror root that receives the missing report
    #[serde(default)]
    pub subtree: String,
}

/// One course page to mirror
#[derive(Debug, Clone, Deserialize)]
pub struct UnitEntry {
    pub label: String,
    pub url: String,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("course-mirror/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}
