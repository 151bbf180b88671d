//! HTTP fetcher implementation
//!
//! This module handles downloading resources for the mirror:
//! - Building the HTTP client (fixed timeout, relaxed certificate validation)
//! - GET requests with status checking
//! - Writing bodies to disk atomically

use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to every resource download
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors from a single resource download
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("write to {path} failed: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Builds an HTTP client for downloading mirror resources
///
/// Certificate validation is relaxed when `accept_invalid_certs` is set: the
/// mirrored origin is known but may serve a non-standard chain.
///
/// # Example
///
/// ```no_run
/// use course_mirror::fetch::{build_http_client, DEFAULT_TIMEOUT};
///
/// let client = build_http_client("course-mirror/1.0", DEFAULT_TIMEOUT, true).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
    accept_invalid_certs: bool,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(30).min(timeout))
        .danger_accept_invalid_certs(accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Downloads `url` and writes the full body to `target`
///
/// Parent directories are created as needed. The body is first written to a
/// sibling temporary file and then renamed into place, so `target` only ever
/// holds a complete download.
///
/// # Returns
///
/// * `Ok(u64)` - Number of bytes written
/// * `Err(FetchError)` - Network error, non-success status, or write failure
pub async fn download_to(client: &Client, url: &str, target: &Path) -> Result<u64, FetchError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response.bytes().await?;
    write_atomic(target, &body).await?;

    Ok(body.len() as u64)
}

/// Writes `contents` to `target` via a temporary file and rename
pub async fn write_atomic(target: &Path, contents: &[u8]) -> Result<(), FetchError> {
    let write_error = |source: std::io::Error| FetchError::Write {
        path: target.to_path_buf(),
        source,
    };

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }

    let mut partial = target.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    if let Err(e) = tokio::fs::write(&partial, contents).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(write_error(e));
    }

    if let Err(e) = tokio::fs::rename(&partial, target).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(write_error(e));
    }

    Ok(())
}
