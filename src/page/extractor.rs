//! Page extraction with bounded retry
//!
//! Evaluation can fail because the page reloaded underneath it. Those failures
//! are retried in place after a fixed delay and a wait for the page to settle.
//! Any other failure, or running out of retries, is returned to the caller.

use crate::page::rewrite::{rewrite_page, ExtractConfig, Extraction};
use crate::page::session::{PageSession, PageSnapshot, SessionError};
use scraper::{Html, Selector};
use std::time::Duration;

/// Retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Pause between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Runs the link pass against a live page session
#[derive(Debug, Clone)]
pub struct PageExtractor {
    max_retries: u32,
    retry_delay: Duration,
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

impl PageExtractor {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// Extracts fetchable URLs and the rewritten HTML from the current page
    ///
    /// # Returns
    ///
    /// * `Ok(Extraction)` - The page was processed
    /// * `Err(SessionError)` - A non-transient failure, or transient failures
    ///   that outlasted the retry budget
    pub async fn extract<S: PageSession>(
        &self,
        session: &mut S,
        config: &ExtractConfig,
    ) -> Result<Extraction, SessionError> {
        config
            .validate()
            .map_err(|e| SessionError::Evaluation(e.to_string()))?;

        self.evaluate_with_retry(session, "Extraction", |snapshot| {
            rewrite_page(snapshot, config)
        })
        .await
    }

    /// Returns true if the current page contains an element matching `sentinel`
    ///
    /// A reload during the check is retried like extraction is.
    pub async fn is_blocked<S: PageSession>(
        &self,
        session: &mut S,
        sentinel: &Selector,
    ) -> Result<bool, SessionError> {
        self.evaluate_with_retry(session, "Blocked check", |snapshot| {
            let document = Html::parse_document(&snapshot.html);
            let found = document.select(sentinel).next().is_some();
            Ok(found)
        })
        .await
    }

    /// Evaluates `f` against the page, retrying transient failures in place
    async fn evaluate_with_retry<S, T, F>(
        &self,
        session: &mut S,
        what: &str,
        f: F,
    ) -> Result<T, SessionError>
    where
        S: PageSession,
        F: Fn(&PageSnapshot) -> Result<T, SessionError>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let result = session
                .evaluate(|snapshot| f(snapshot))
                .await
                .and_then(|inner| inner);

            match result {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{} succeeded on attempt {}", what, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    tracing::warn!(
                        "{} attempt {}/{} failed: {}; retrying in {:?}",
                        what,
                        attempt,
                        self.max_retries + 1,
                        e,
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    self.settle(session).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn settle<S: PageSession>(&self, session: &mut S) -> Result<(), SessionError> {
        match session.wait_until_ready().await {
            Ok(()) => Ok(()),
            Err(e) if e.is_transient() => {
                tracing::debug!("Page still reloading: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Parses a CSS selector used as a blocked-unit sentinel
pub fn parse_sentinel(selector: &str) -> Result<Selector, crate::ConfigError> {
    Selector::parse(selector).map_err(|e| {
        crate::ConfigError::InvalidPattern(format!("Invalid sentinel selector '{}': {:?}", selector, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::substitute::TextSubstitutions;
    use crate::url::{RewriteRule, ScopeConfig};
    use std::collections::VecDeque;
    use url::Url;

    /// A session whose evaluations fail with queued errors before succeeding
    struct FlakySession {
        snapshot: PageSnapshot,
        failures: VecDeque<SessionError>,
        evaluations: u32,
        ready_waits: u32,
    }

    impl FlakySession {
        fn new(failures: Vec<SessionError>) -> Self {
            Self {
                snapshot: PageSnapshot {
                    url: Url::parse("https://courses.example.edu/course_builder/2425/algebra/")
                        .unwrap(),
                    html: r#"<a href="a.pdf">a</a><p class="locked">x</p>"#.to_string(),
                },
                failures: failures.into(),
                evaluations: 0,
                ready_waits: 0,
            }
        }
    }

    impl PageSession for FlakySession {
        async fn navigate(&mut self, _url: &Url) -> Result<(), SessionError> {
            Ok(())
        }

        async fn evaluate<T, F>(&mut self, f: F) -> Result<T, SessionError>
        where
            F: FnOnce(&PageSnapshot) -> T,
        {
            self.evaluations += 1;
            match self.failures.pop_front() {
                Some(e) => Err(e),
                None => Ok(f(&self.snapshot)),
            }
        }

        async fn wait_until_ready(&mut self) -> Result<(), SessionError> {
            self.ready_waits += 1;
            Ok(())
        }
    }

    fn destroyed(n: usize) -> Vec<SessionError> {
        (0..n)
            .map(|_| SessionError::ContextDestroyed("page navigated".to_string()))
            .collect()
    }

    fn config() -> ExtractConfig {
        ExtractConfig::new(
            ScopeConfig::new(["courses.example.edu"], ["/course_builder/"], Vec::<String>::new())
                .unwrap(),
            RewriteRule::default(),
            TextSubstitutions::default(),
        )
    }

    fn extractor() -> PageExtractor {
        PageExtractor::new(DEFAULT_MAX_RETRIES, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_first_time() {
        let mut session = FlakySession::new(vec![]);
        let extraction = extractor().extract(&mut session, &config()).await.unwrap();
        assert_eq!(extraction.fetchable_urls.len(), 1);
        assert_eq!(session.evaluations, 1);
        assert_eq!(session.ready_waits, 0);
    }

    #[tokio::test]
    async fn test_two_transient_failures_then_success() {
        let mut session = FlakySession::new(destroyed(2));
        let extraction = extractor().extract(&mut session, &config()).await.unwrap();
        assert_eq!(
            extraction.fetchable_urls,
            vec!["https://courses.example.edu/course_builder/2425/algebra/a.pdf"]
        );
        assert_eq!(session.evaluations, 3);
        assert_eq!(session.ready_waits, 2);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let mut session = FlakySession::new(destroyed(4));
        let result = extractor().extract(&mut session, &config()).await;
        assert!(matches!(result, Err(SessionError::ContextDestroyed(_))));
        assert_eq!(session.evaluations, 4);
    }

    #[tokio::test]
    async fn test_last_retry_can_succeed() {
        let mut session = FlakySession::new(destroyed(3));
        assert!(extractor().extract(&mut session, &config()).await.is_ok());
        assert_eq!(session.evaluations, 4);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let mut session = FlakySession::new(vec![SessionError::Evaluation("boom".to_string())]);
        let result = extractor().extract(&mut session, &config()).await;
        assert!(matches!(result, Err(SessionError::Evaluation(_))));
        assert_eq!(session.evaluations, 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_evaluation() {
        let mut session = FlakySession::new(vec![]);
        let mut cfg = config();
        cfg.version = 0;
        assert!(extractor().extract(&mut session, &cfg).await.is_err());
        assert_eq!(session.evaluations, 0);
    }

    #[tokio::test]
    async fn test_is_blocked() {
        let mut session = FlakySession::new(vec![]);
        let present = parse_sentinel("p.locked").unwrap();
        let absent = parse_sentinel("a.enrol").unwrap();
        assert!(extractor().is_blocked(&mut session, &present).await.unwrap());
        assert!(!extractor().is_blocked(&mut session, &absent).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_blocked_retries_reload() {
        let mut session = FlakySession::new(destroyed(2));
        let present = parse_sentinel("p.locked").unwrap();
        assert!(extractor().is_blocked(&mut session, &present).await.unwrap());
        assert_eq!(session.evaluations, 3);
        assert_eq!(session.ready_waits, 2);
    }

    #[tokio::test]
    async fn test_is_blocked_retry_budget_exhausted() {
        let mut session = FlakySession::new(destroyed(4));
        let present = parse_sentinel("p.locked").unwrap();
        let result = extractor().is_blocked(&mut session, &present).await;
        assert!(matches!(result, Err(SessionError::ContextDestroyed(_))));
        assert_eq!(session.evaluations, 4);
    }

    #[test]
    fn test_parse_sentinel_invalid() {
        assert!(parse_sentinel("a[").is_err());
    }
}
