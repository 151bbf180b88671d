//! Mirror coordinator - per-unit orchestration
//!
//! Units are processed one at a time in selection order. For each unit the page
//! is loaded, optionally checked against the blocked sentinel, run through the
//! retrying link pass, saved with its rewritten links, and then every fetchable
//! resource is downloaded. Failures are recovered at the narrowest scope: a bad
//! link is skipped, a failed resource is recorded, a failed unit is abandoned.
//! Only run-level problems (nothing to mirror, unwritable report) end the run.

use crate::config::Config;
use crate::fetch::{build_http_client, write_atomic, FetchPipeline, FetchSummary};
use crate::page::{ExtractConfig, PageExtractor, PageSession, TextSubstitutions};
use crate::progress::{ProgressSink, ProgressState, ProgressTracker};
use crate::report::MissingLog;
use crate::MirrorError;
use scraper::Selector;
use std::path::PathBuf;
use url::Url;

/// One course page selected for mirroring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub label: String,
    pub url: Url,
}

/// Run options that come from the command line rather than the config file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only process units with these labels; empty means every configured unit
    pub unit_filter: Vec<String>,

    /// Substitutions merged over the config's own table
    pub substitutions: Option<TextSubstitutions>,
}

/// Totals for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub units_total: usize,
    pub units_failed: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed_resources: usize,
    /// Path of the missing report, if one was written
    pub report: Option<PathBuf>,
}

impl RunSummary {
    fn add(&mut self, fetched: FetchSummary) {
        self.downloaded += fetched.downloaded;
        self.skipped += fetched.skipped;
        self.failed_resources += fetched.failed;
    }
}

/// Main mirror coordinator structure
pub struct Coordinator {
    units: Vec<Unit>,
    pipeline: FetchPipeline,
    extractor: PageExtractor,
    extract_config: ExtractConfig,
    sentinel: Option<Selector>,
    tracker: ProgressTracker,
    missing: Option<MissingLog>,
    subtree: String,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated mirror configuration
    /// * `options` - Unit filter and extra substitutions from the command line
    /// * `sink` - Where progress is rendered
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(MirrorError)` - The configuration could not be turned into a run
    pub fn new(
        config: &Config,
        options: RunOptions,
        sink: Box<dyn ProgressSink>,
    ) -> Result<Self, MirrorError> {
        let units = select_units(config, &options.unit_filter)?;

        // A hand-picked subset never writes the report, whatever the mode says.
        let reporting = config.reporting_enabled() && options.unit_filter.is_empty();

        let client = build_http_client(
            &config.fetch.user_agent,
            config.fetch_timeout(),
            config.fetch.accept_invalid_certs,
        )?;

        let pipeline = FetchPipeline::new(
            client,
            config.scope_config()?,
            config.mirror_root(),
            config.mirror.tree_root.clone(),
        );

        Ok(Self {
            units,
            pipeline,
            extractor: config.page_extractor(),
            extract_config: config.extract_config(options.substitutions)?,
            sentinel: config.blocked_sentinel()?,
            tracker: ProgressTracker::new(sink),
            missing: reporting.then(MissingLog::new),
            subtree: config.selection.subtree.clone(),
        })
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn reporting_enabled(&self) -> bool {
        self.missing.is_some()
    }

    pub fn progress(&self) -> ProgressState {
        self.tracker.state()
    }

    pub fn missing_log(&self) -> Option<&MissingLog> {
        self.missing.as_ref()
    }

    /// Runs every selected unit through `session`
    ///
    /// The progress display is cleared before returning, on success and on
    /// failure alike.
    pub async fn run<S: PageSession>(&mut self, session: &mut S) -> Result<RunSummary, MirrorError> {
        let result = self.run_units(session).await;
        self.tracker.finish();
        result
    }

    async fn run_units<S: PageSession>(&mut self, session: &mut S) -> Result<RunSummary, MirrorError> {
        if self.units.is_empty() {
            return Err(MirrorError::NoUnits);
        }

        let mut summary = RunSummary {
            units_total: self.units.len(),
            ..RunSummary::default()
        };

        self.tracker.start_run(self.units.len() as u64);
        tracing::info!(
            "Mirroring {} unit(s) into {} (report {})",
            self.units.len(),
            self.pipeline.mirror_root().display(),
            if self.missing.is_some() { "on" } else { "off" }
        );

        for index in 0..self.units.len() {
            let unit = self.units[index].clone();
            tracing::info!("[{}] Processing {}", unit.label, unit.url);

            match self.process_unit(session, &unit).await {
                Ok(fetched) => {
                    tracing::info!(
                        "[{}] Done: {} downloaded, {} already present, {} failed",
                        unit.label,
                        fetched.downloaded,
                        fetched.skipped,
                        fetched.failed
                    );
                    summary.add(fetched);
                }
                Err(e) => {
                    tracing::error!("[{}] Unit abandoned: {}", unit.label, e);
                    if let Some(log) = self.missing.as_mut() {
                        log.record(&unit.label, unit.url.as_str(), e.to_string());
                    }
                    summary.units_failed += 1;
                }
            }

            self.tracker.finish_unit();
        }

        if let Some(log) = &self.missing {
            summary.report = log.write(self.pipeline.mirror_root(), &self.subtree)?;
            if let Some(path) = &summary.report {
                tracing::warn!("{} missing item(s) listed in {}", log.len(), path.display());
            }
        }

        Ok(summary)
    }

    /// Processes a single unit
    ///
    /// This method:
    /// 1. Loads the unit page
    /// 2. Checks the blocked sentinel, if configured
    /// 3. Extracts links with bounded retry
    /// 4. Saves the rewritten page
    /// 5. Downloads every fetchable resource
    async fn process_unit<S: PageSession>(
        &mut self,
        session: &mut S,
        unit: &Unit,
    ) -> Result<FetchSummary, MirrorError> {
        session.navigate(&unit.url).await?;

        if let Some(sentinel) = &self.sentinel {
            if self.extractor.is_blocked(session, sentinel).await? {
                tracing::warn!("[{}] Blocked page, skipping", unit.label);
                return Err(MirrorError::Blocked {
                    unit: unit.label.clone(),
                });
            }
        }

        let extraction = self
            .extractor
            .extract(session, &self.extract_config)
            .await
            .map_err(|source| MirrorError::Extraction {
                unit: unit.label.clone(),
                source,
            })?;

        if extraction.skipped_links > 0 {
            tracing::debug!(
                "[{}] {} malformed link(s) left untouched",
                unit.label,
                extraction.skipped_links
            );
        }

        if extraction.fetchable_urls.is_empty() {
            return Err(MirrorError::NoFetchableLinks {
                unit: unit.label.clone(),
            });
        }

        let page_url = Url::parse(&extraction.page_url)?;
        let page_target = self.pipeline.local_target(&page_url)?;
        write_atomic(&page_target, extraction.rewritten_html.as_bytes()).await?;
        tracing::debug!("[{}] Saved page to {}", unit.label, page_target.display());

        let results = self
            .pipeline
            .fetch_unit(
                &unit.label,
                &extraction.fetchable_urls,
                &mut self.tracker,
                self.missing.as_mut(),
            )
            .await;

        Ok(FetchSummary::from_results(&results))
    }
}

/// Resolves the configured units, narrowed to `filter` when it is non-empty
fn select_units(config: &Config, filter: &[String]) -> Result<Vec<Unit>, MirrorError> {
    for label in filter {
        if !config.units.iter().any(|u| &u.label == label) {
            tracing::warn!("No configured unit is labelled '{}'", label);
        }
    }

    config
        .units
        .iter()
        .filter(|u| filter.is_empty() || filter.contains(&u.label))
        .map(|u| -> Result<Unit, MirrorError> {
            Ok(Unit {
                label: u.label.clone(),
                url: Url::parse(&u.url)?,
            })
        })
        .collect()
}
