//! Page session boundary
//!
//! The mirror never drives a browser itself. It talks to a [`PageSession`], which
//! can load a page, run a pure function against the loaded document and report
//! when the page has settled. Errors are typed at this boundary: a page that
//! reloaded mid-evaluation is [`SessionError::ContextDestroyed`], and only that
//! variant is retried by the extractor.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors reported by a page session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The page navigated or reloaded while it was being evaluated
    #[error("Execution context was destroyed: {0}")]
    ContextDestroyed(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("No page is loaded")]
    NoPage,
}

impl SessionError {
    /// Returns true if the failure is worth retrying in place
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ContextDestroyed(_))
    }
}

/// The rendered state of the current page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    /// Final URL of the page, after redirects
    pub url: Url,

    /// Serialized DOM of the page
    pub html: String,
}

/// A single page context that can be navigated and evaluated
///
/// Implementations expose one page at a time; callers never evaluate
/// concurrently against the same session.
#[allow(async_fn_in_trait)]
pub trait PageSession {
    /// Loads `url` and waits until the DOM is parsed and the network is mostly idle
    async fn navigate(&mut self, url: &Url) -> Result<(), SessionError>;

    /// Runs a pure function against the current page and returns its result
    async fn evaluate<T, F>(&mut self, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&PageSnapshot) -> T;

    /// Waits until the page is in a stable, fully-loaded state
    async fn wait_until_ready(&mut self) -> Result<(), SessionError>;
}

/// A session backed by plain HTTP: the served HTML is the page
///
/// Pages are not scripted, so evaluations never observe a reload and this
/// session never reports [`SessionError::ContextDestroyed`].
pub struct HttpSession {
    client: Client,
    current: Option<PageSnapshot>,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            current: None,
        }
    }

    /// Builds a session with its own client
    pub fn with_timeout(user_agent: &str, timeout: Duration, accept_invalid_certs: bool) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self::new(client))
    }

    pub fn current(&self) -> Option<&PageSnapshot> {
        self.current.as_ref()
    }
}

impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), SessionError> {
        self.current = None;

        let navigation_error = |message: String| SessionError::Navigation {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        tracing::debug!("Loaded {} ({} bytes)", final_url, html.len());
        self.current = Some(PageSnapshot {
            url: final_url,
            html,
        });

        Ok(())
    }

    async fn evaluate<T, F>(&mut self, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&PageSnapshot) -> T,
    {
        self.current.as_ref().map(f).ok_or(SessionError::NoPage)
    }

    async fn wait_until_ready(&mut self) -> Result<(), SessionError> {
        if self.current.is_some() {
            Ok(())
        } else {
            Err(SessionError::NoPage)
        }
    }
}
