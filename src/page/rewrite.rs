//! Link extraction and in-page rewriting
//!
//! One streaming pass over the page HTML (via lol_html) that:
//! - applies the text-substitution dictionary to text nodes and hrefs
//! - normalizes and classifies every `<a href>`
//! - rewrites in-tree links to relative paths and other links to absolute URLs
//! - collects the fetchable URLs in document order
//!
//! The decision for a single link lives in [`resolve_link`]; the fetch pipeline
//! re-applies the same [`classify`] before downloading.

use crate::page::session::{PageSnapshot, SessionError};
use crate::page::substitute::TextSubstitutions;
use crate::url::{classify, is_in_tree, normalize, relative_href, Disposition, RewriteRule, ScopeConfig};
use crate::{ConfigError, UrlError};
use lol_html::html_content::ContentType;
use lol_html::{doc_text, element, HtmlRewriter, Settings};
use url::Url;

/// Current layout of [`ExtractConfig`]
pub const EXTRACT_CONFIG_VERSION: u32 = 1;

/// Everything the page-side pass needs, handed across the evaluation boundary
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub version: u32,
    pub scope: ScopeConfig,
    pub rules: RewriteRule,
    pub substitutions: TextSubstitutions,
    /// Leading path segment dropped when pages and resources are saved
    pub tree_root: String,
}

impl ExtractConfig {
    pub fn new(scope: ScopeConfig, rules: RewriteRule, substitutions: TextSubstitutions) -> Self {
        Self {
            version: EXTRACT_CONFIG_VERSION,
            scope,
            rules,
            substitutions,
            tree_root: String::new(),
        }
    }

    pub fn with_tree_root(mut self, tree_root: impl Into<String>) -> Self {
        self.tree_root = tree_root.into();
        self
    }

    /// Checks the config before it crosses into page evaluation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != EXTRACT_CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// What to do with one `<a href>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Empty or fragment-only href; points into the page itself
    InPage,
    /// Excluded or script link; left untouched and never fetched
    Dropped,
    /// Replace the href, and download `fetch` if present
    Rewrite { href: String, fetch: Option<String> },
}

/// Decides the fate of one raw href found on `page_url`
///
/// `page_url` must already be normalized. Malformed hrefs are returned as errors
/// so the caller can skip them individually.
pub fn resolve_link(raw_href: &str, page_url: &Url, config: &ExtractConfig) -> Result<LinkOutcome, UrlError> {
    let trimmed = raw_href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(LinkOutcome::InPage);
    }

    let url = normalize(trimmed, page_url, &config.rules)?;

    let disposition = classify(&url, trimmed, &config.scope);
    if disposition == Disposition::Dropped {
        return Ok(LinkOutcome::Dropped);
    }

    let href = if is_in_tree(&url, page_url, &config.scope) {
        relative_href(page_url, &url, &config.tree_root)
    } else {
        url.to_string()
    };

    let fetch = disposition.should_fetch().then(|| {
        let mut target = url.clone();
        target.set_fragment(None);
        target.to_string()
    });

    Ok(LinkOutcome::Rewrite { href, fetch })
}

/// Result of processing one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// The page URL after host/path rewriting
    pub page_url: String,

    /// Fetchable resource URLs in document order (duplicates kept)
    pub fetchable_urls: Vec<String>,

    /// Serialized page with every href rewritten
    pub rewritten_html: String,

    /// Number of hrefs skipped because they could not be parsed
    pub skipped_links: usize,
}

/// Runs the link pass over a page snapshot
pub fn rewrite_page(snapshot: &PageSnapshot, config: &ExtractConfig) -> Result<Extraction, SessionError> {
    let page_url = normalize(snapshot.url.as_str(), &snapshot.url, &config.rules)
        .unwrap_or_else(|_| snapshot.url.clone());

    let substitutions = &config.substitutions;
    let mut fetchable_urls = Vec::new();
    let mut skipped_links = 0usize;
    let mut pending_text = String::new();
    let mut output = Vec::with_capacity(snapshot.html.len());

    let mut document_content_handlers = Vec::new();
    if !substitutions.is_empty() {
        // Text arrives in chunks; hold them back until the node is complete so a
        // fragment split across chunks is still replaced.
        document_content_handlers.push(doc_text!(|t| {
            pending_text.push_str(t.as_str());
            if t.last_in_text_node() {
                let replaced = substitutions.apply(&pending_text);
                t.replace(&replaced, ContentType::Html);
                pending_text.clear();
            } else {
                t.remove();
            }
            Ok(())
        }));
    }

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("a[href]", |el| {
                let Some(original) = el.get_attribute("href") else {
                    return Ok(());
                };

                let raw = substitutions.apply(&original);
                if raw != original {
                    el.set_attribute("href", &raw)?;
                }

                match resolve_link(&raw, &page_url, config) {
                    Ok(LinkOutcome::InPage) => {}
                    Ok(LinkOutcome::Dropped) => {
                        tracing::debug!("Dropped link: {}", raw);
                    }
                    Ok(LinkOutcome::Rewrite { href, fetch }) => {
                        el.set_attribute("href", &href)?;
                        if let Some(url) = fetch {
                            fetchable_urls.push(url);
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Skipping malformed href '{}': {}", raw, e);
                        skipped_links += 1;
                    }
                }

                Ok(())
            })],
            document_content_handlers,
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(snapshot.html.as_bytes())
        .map_err(|e| SessionError::Evaluation(format!("HTML rewrite error: {}", e)))?;
    rewriter
        .end()
        .map_err(|e| SessionError::Evaluation(format!("HTML rewrite finalization error: {}", e)))?;

    let rewritten_html = String::from_utf8(output)
        .map_err(|e| SessionError::Evaluation(format!("Invalid UTF-8 in rewritten HTML: {}", e)))?;

    Ok(Extraction {
        page_url: page_url.to_string(),
        fetchable_urls,
        rewritten_html,
        skipped_links,
    })
}
