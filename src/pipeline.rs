//! Crawl driver: discover → fetch → extract → write.
//!
//! 1. **Discovery**: fetch every landing page and union their article links
//! 2. **Fetching**: drain the whole link set through the worker pool once
//! 3. **Extraction**: build one [`ArticleRecord`](crate::models::ArticleRecord)
//!    per successful fetch
//! 4. **Output**: append each record to the sink
//!
//! Site and link failures are reported as diagnostics and never abort the
//! run. Only a sink write error does.

use crate::config::AppConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::models::{FetchResult, LinkSet};
use crate::outputs::csv::{CsvSink, SinkError};
use crate::scrapers::article::ArticleExtractor;
use crate::scrapers::fetch::Fetcher;
use crate::scrapers::links::extract_links;
use crate::scrapers::pool::run_pool;
use scraper::Html;
use tracing::{info, instrument};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sites: usize,
    pub sites_failed: usize,
    pub discovered: usize,
    pub fetched: usize,
    pub failed: usize,
    pub written: usize,
    pub undated: usize,
}

pub struct Pipeline<'a, F> {
    config: &'a AppConfig,
    fetcher: &'a F,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a, F: Fetcher> Pipeline<'a, F> {
    pub fn new(config: &'a AppConfig, fetcher: &'a F, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            config,
            fetcher,
            diagnostics,
        }
    }

    /// Union of the article links on every configured landing page.
    ///
    /// Returns the link set and the number of sites whose landing page
    /// could not be fetched.
    #[instrument(level = "info", skip_all, fields(sites = self.config.sites.len()))]
    pub async fn discover_links(&self) -> (LinkSet, usize) {
        let mut links = LinkSet::new();
        let mut failed = 0;

        for site in &self.config.sites {
            let page = match self.fetcher.fetch(site.landing_url.as_str()).await {
                Ok(page) => page,
                Err(err) => {
                    failed += 1;
                    self.diagnostics.report(Diagnostic::DiscoveryFailed {
                        site: site.landing_url.to_string(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            let found = {
                let document = Html::parse_document(&page.body);
                extract_links(&document, site, self.diagnostics)
            };
            info!(
                count = found.len(),
                site = %page.final_url,
                "Links collected from landing page"
            );
            links.extend(found);
        }

        info!(total = links.len(), "Link discovery complete");
        (links, failed)
    }

    /// Run the whole crawl, appending every extracted record to `sink`.
    ///
    /// # Arguments
    ///
    /// * `sink` - Open CSV sink; each record is flushed as it is written
    ///
    /// # Returns
    ///
    /// The [`RunSummary`] counters, or the first [`SinkError`]. Fetch and
    /// extraction failures only produce diagnostics.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self, sink: &mut CsvSink) -> Result<RunSummary, SinkError> {
        let (links, sites_failed) = self.discover_links().await;
        let mut summary = RunSummary {
            sites: self.config.sites.len(),
            sites_failed,
            discovered: links.len(),
            ..Default::default()
        };

        let results = run_pool(self.fetcher, links, self.config.workers, self.diagnostics).await;

        let extractor = ArticleExtractor::new(&self.config.date_rules, &self.config.date_formats);
        for result in results {
            match result {
                FetchResult::Success { body, final_url } => {
                    summary.fetched += 1;
                    let record = extractor.extract(&final_url, &body, self.diagnostics);
                    if record.parsed_date.is_none() {
                        summary.undated += 1;
                    }
                    sink.append(&record)?;
                    summary.written += 1;
                }
                FetchResult::Failure { .. } => summary.failed += 1,
            }
        }

        info!(
            sites = summary.sites,
            sites_failed = summary.sites_failed,
            discovered = summary.discovered,
            fetched = summary.fetched,
            failed = summary.failed,
            written = summary.written,
            undated = summary.undated,
            "Crawl complete"
        );
        Ok(summary)
    }
}
