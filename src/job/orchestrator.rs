//! Runs one job from input to export
//!
//! The session is torn down on every exit path; the status ends in
//! `completed` with the export path or in `failed` with the error message.

use crate::config::Config;
use crate::crawler::{CrawlFrontier, PageExtractor, RuleBook, SearchAcquirer, TechStackClient};
use crate::identity::{launcher_for, IdentityManager, SessionLauncher};
use crate::job::{JobContext, JobInput, JobSpec};
use crate::output::Exporter;
use crate::state::{CrawlLedger, JobStatus};
use crate::url::UrlValidator;
use crate::{ConfigError, HarvestError};
use std::path::PathBuf;
use std::sync::Arc;

/// Drives jobs against one configuration
pub struct JobOrchestrator {
    config: Arc<Config>,
    launcher: Arc<dyn SessionLauncher>,
    context: JobContext,
}

/// Per-job collaborators built from the configuration
struct Toolkit {
    extractor: PageExtractor,
    validator: UrlValidator,
    frontier: CrawlFrontier,
}

impl JobOrchestrator {
    pub fn new(config: Arc<Config>, launcher: Arc<dyn SessionLauncher>, context: JobContext) -> Self {
        Self {
            config,
            launcher,
            context,
        }
    }

    /// Builds an orchestrator using the session engine named in the configuration
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let launcher = launcher_for(&config.identity, &config.pacing)?;
        Ok(Self::new(Arc::new(config), launcher, JobContext::new()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn launcher(&self) -> Arc<dyn SessionLauncher> {
        Arc::clone(&self.launcher)
    }

    pub fn context(&self) -> &JobContext {
        &self.context
    }

    /// Runs a job in the foreground
    ///
    /// # Returns
    ///
    /// The final status snapshot (`completed` or `failed`)
    pub async fn run(&self, spec: JobSpec) -> JobStatus {
        self.context.begin();
        self.drive(spec).await
    }

    /// Runs a job whose status has already been set to running
    pub(crate) async fn drive(&self, spec: JobSpec) -> JobStatus {
        match self.execute(&spec).await {
            Ok((count, output_path)) => {
                tracing::info!(count, "Job completed");
                self.context
                    .complete(output_path, format!("Scraped {} companies", count));
            }
            Err(e) => {
                tracing::error!("Job failed: {}", e);
                self.context.fail(e.to_string());
            }
        }
        self.context.snapshot()
    }

    async fn execute(&self, spec: &JobSpec) -> crate::Result<(usize, Option<PathBuf>)> {
        let input = spec
            .input
            .as_ref()
            .filter(|input| !input.is_empty())
            .ok_or(HarvestError::NoInput)?;

        let toolkit = self.toolkit(spec)?;
        let mut identity =
            IdentityManager::init(&self.config.identity, Arc::clone(&self.launcher)).await?;
        let mut ledger = CrawlLedger::new();

        let harvested = match input {
            JobInput::Query { query, pages } => {
                self.harvest_query(&toolkit, &mut ledger, &mut identity, spec, query, *pages)
                    .await
            }
            JobInput::Seeds { urls } => {
                self.harvest_seeds(&toolkit, &mut ledger, &mut identity, spec, urls)
                    .await;
                Ok(())
            }
        };

        identity.shutdown().await;
        harvested?;

        let records = ledger.into_records();
        let output_path = Exporter::export(&records, spec.output_format, &spec.output_name)?;
        Ok((records.len(), output_path))
    }

    fn toolkit(&self, spec: &JobSpec) -> crate::Result<Toolkit> {
        let config = &self.config;
        let rules = RuleBook::compile(&config.selectors).with_overrides(&spec.selector_overrides);
        let enrichment = TechStackClient::new(&config.enrichment, &config.identity.user_agents)?;

        Ok(Toolkit {
            extractor: PageExtractor::new(rules, enrichment, config.pacing.clone()),
            validator: UrlValidator::new(&config.identity, config.pacing.probe_timeout()),
            frontier: CrawlFrontier::new(config.crawl.max_pages),
        })
    }

    async fn harvest_query(
        &self,
        toolkit: &Toolkit,
        ledger: &mut CrawlLedger,
        identity: &mut IdentityManager,
        spec: &JobSpec,
        query: &str,
        pages: u32,
    ) -> crate::Result<()> {
        let acquirer = SearchAcquirer::new(
            self.config.search.clone(),
            self.config.pacing.clone(),
            toolkit.validator.clone(),
        );

        let urls = acquirer
            .fetch_candidate_urls(ledger, identity, query, pages, self.config.search.max_retries)
            .await;

        if urls.is_empty() {
            return Err(HarvestError::NoSearchResults);
        }

        let total = urls.len();
        self.context.record_progress(0, total, ledger.error_count());
        tracing::info!(query, total, "Scraping search results");

        for (idx, url) in urls.iter().enumerate() {
            toolkit
                .extractor
                .scrape_page(ledger, identity, url, spec.level)
                .await;
            self.context
                .record_progress(idx + 1, total, ledger.error_count());
        }

        Ok(())
    }

    async fn harvest_seeds(
        &self,
        toolkit: &Toolkit,
        ledger: &mut CrawlLedger,
        identity: &mut IdentityManager,
        spec: &JobSpec,
        urls: &[String],
    ) {
        let total = urls.len();
        self.context.set_total(total);

        for (idx, url) in urls.iter().enumerate() {
            let (is_valid, clean_url) = toolkit.validator.validate(url).await;

            if is_valid {
                toolkit
                    .extractor
                    .scrape_page(ledger, identity, &clean_url, spec.level)
                    .await;

                if spec.discovery_depth > 0 {
                    let discovered = toolkit
                        .frontier
                        .discover(
                            &toolkit.extractor,
                            ledger,
                            identity,
                            &clean_url,
                            spec.discovery_depth,
                        )
                        .await;
                    tracing::info!(seed = %clean_url, discovered, "Discovery finished");
                }
            } else {
                tracing::error!(url = %url, "Invalid URL");
                ledger.record_error();
            }

            self.context
                .record_progress(idx + 1, total, ledger.error_count());
        }
    }
}
