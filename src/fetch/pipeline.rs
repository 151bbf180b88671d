//! Sequential resource download for one unit
//!
//! URLs are re-classified with the same scope before anything is requested,
//! mapped to their local file, skipped if that file exists, and otherwise
//! downloaded one at a time in document order.

use crate::fetch::fetcher::download_to;
use crate::progress::ProgressTracker;
use crate::report::MissingLog;
use crate::url::{classify, local_target, Disposition, ScopeConfig};
use crate::UrlError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use url::Url;

/// Outcome of fetching a single resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// The local file already existed; no request was made
    Skipped,
    /// The resource was downloaded and written
    Downloaded,
    /// Retrieval or write failed
    Failed(String),
}

/// Result of fetching one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub target: Option<PathBuf>,
    pub status: FetchStatus,
}

/// Counts of fetch outcomes for a unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FetchSummary {
    pub fn from_results(results: &[FetchResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            match r.status {
                FetchStatus::Skipped => acc.skipped += 1,
                FetchStatus::Downloaded => acc.downloaded += 1,
                FetchStatus::Failed(_) => acc.failed += 1,
            }
            acc
        })
    }
}

/// Downloads classified resources under the mirror root
pub struct FetchPipeline {
    client: Client,
    scope: ScopeConfig,
    mirror_root: PathBuf,
    tree_root: String,
}

impl FetchPipeline {
    pub fn new(client: Client, scope: ScopeConfig, mirror_root: PathBuf, tree_root: String) -> Self {
        Self {
            client,
            scope,
            mirror_root,
            tree_root,
        }
    }

    pub fn mirror_root(&self) -> &Path {
        &self.mirror_root
    }

    /// The file `url` is stored as under the mirror root
    pub fn local_target(&self, url: &Url) -> Result<PathBuf, UrlError> {
        local_target(url, &self.mirror_root, &self.tree_root)
    }

    /// Keeps only URLs that classify as fetchable, in their original order
    pub fn filter(&self, urls: &[String]) -> Vec<Url> {
        urls.iter()
            .filter_map(|raw| match Url::parse(raw) {
                Ok(url) => match classify(&url, raw, &self.scope) {
                    Disposition::Fetchable => Some(url),
                    other => {
                        tracing::debug!("Not fetching {} ({:?})", raw, other);
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!("Ignoring unparsable URL {}: {}", raw, e);
                    None
                }
            })
            .collect()
    }

    /// Fetches a single resource
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        let target = match self.local_target(url) {
            Ok(target) => target,
            Err(e) => {
                return FetchResult {
                    url: url.to_string(),
                    target: None,
                    status: FetchStatus::Failed(e.to_string()),
                }
            }
        };

        if tokio::fs::metadata(&target).await.is_ok() {
            tracing::debug!("Already present: {}", target.display());
            return FetchResult {
                url: url.to_string(),
                target: Some(target),
                status: FetchStatus::Skipped,
            };
        }

        let status = match download_to(&self.client, url.as_str(), &target).await {
            Ok(bytes) => {
                tracing::debug!("Downloaded {} ({} bytes)", url, bytes);
                FetchStatus::Downloaded
            }
            Err(e) => FetchStatus::Failed(e.to_string()),
        };

        FetchResult {
            url: url.to_string(),
            target: Some(target),
            status,
        }
    }

    /// Fetches every fetchable URL of a unit in order
    ///
    /// A failed resource never stops the unit. Failures are logged and, when a
    /// missing log is supplied, recorded there.
    pub async fn fetch_unit(
        &self,
        unit_label: &str,
        urls: &[String],
        tracker: &mut ProgressTracker,
        mut missing: Option<&mut MissingLog>,
    ) -> Vec<FetchResult> {
        let urls = self.filter(urls);
        tracker.start_unit(urls.len() as u64);

        let mut results = Vec::with_capacity(urls.len());
        for url in &urls {
            let result = self.fetch(url).await;

            if let FetchStatus::Failed(reason) = &result.status {
                tracing::warn!("[{}] Failed to fetch {}: {}", unit_label, result.url, reason);
                if let Some(log) = missing.as_deref_mut() {
                    log.record(unit_label, &result.url, reason.clone());
                }
            }

            tracker.resource_done();
            results.push(result);
        }

        results
    }
}
