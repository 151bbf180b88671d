use crate::config::types::{Config, SelectionMode};
use crate::page::{parse_sentinel, ExtractConfig, PageExtractor, TextSubstitutions};
use crate::url::{HostFix, PathSegmentRewrite, RewriteRule, ScopeConfig};
use crate::ConfigError;
use scraper::Selector;
use std::path::PathBuf;
use std::time::Duration;

impl Config {
    pub fn scope_config(&self) -> Result<ScopeConfig, ConfigError> {
        ScopeConfig::new(
            &self.scope.allowed_hosts,
            &self.scope.allowed_path_prefixes,
            &self.scope.excluded_prefixes,
        )
    }

    pub fn rewrite_rule(&self) -> Result<RewriteRule, ConfigError> {
        let host_fix = self
            .rewrite
            .host_fix
            .as_ref()
            .map(|fix| HostFix::new(&fix.from, &fix.to))
            .transpose()?;

        let path_rewrite = self
            .rewrite
            .path_segment
            .as_ref()
            .map(|seg| PathSegmentRewrite::new(&seg.anchor, &seg.prefix, &seg.digits))
            .transpose()?;

        Ok(RewriteRule {
            host_fix,
            path_rewrite,
        })
    }

    /// Substitutions from the config, with `extra` merged over them
    pub fn substitutions(&self, extra: Option<TextSubstitutions>) -> TextSubstitutions {
        let mut subs = TextSubstitutions::new(self.substitutions.clone());
        if let Some(extra) = extra {
            subs.merge(extra);
        }
        subs
    }

    pub fn extract_config(&self, extra: Option<TextSubstitutions>) -> Result<ExtractConfig, ConfigError> {
        Ok(ExtractConfig::new(
            self.scope_config()?,
            self.rewrite_rule()?,
            self.substitutions(extra),
        )
        .with_tree_root(self.mirror.tree_root.as_str()))
    }

    pub fn page_extractor(&self) -> PageExtractor {
        PageExtractor::new(
            self.extract.max_retries,
            Duration::from_millis(self.extract.retry_delay_ms),
        )
    }

    pub fn blocked_sentinel(&self) -> Result<Option<Selector>, ConfigError> {
        self.extract
            .blocked_sentinel
            .as_deref()
            .map(parse_sentinel)
            .transpose()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    pub fn mirror_root(&self) -> PathBuf {
        PathBuf::from(&self.mirror.root)
    }

    /// Failure reporting is on only for whole-tree selections
    pub fn reporting_enabled(&self) -> bool {
        self.selection.mode == SelectionMode::Tree
    }
}
