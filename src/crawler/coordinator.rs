//! Harvest coordinator - the per-namespace run loop
//!
//! This module drives one namespace through its phases:
//! - Warming up the fetcher session
//! - Discovering listing pages and detail links
//! - Fetching, parsing and emitting every detail link in order
//! - Finishing the output, also when cancelled

use crate::config::Config;
use crate::crawler::detail::parse_detail_page;
use crate::crawler::frontier::{Discovery, Frontier};
use crate::fetcher::Fetcher;
use crate::output::{ErrorRecord, HarvestRecord, HarvestSummary, OutputSink};
use crate::state::{HarvestPhase, RecordStep};
use crate::url::namespace_root;
use crate::HarvestError;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Values a run needs besides its fetcher and sink
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub base_url: Url,

    /// Optional cap on listing pages per namespace
    pub max_pages: Option<usize>,
}

impl HarvestOptions {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            max_pages: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        Ok(Self {
            base_url: config.base_url()?,
            max_pages: config.harvest.max_pages,
        })
    }
}

/// Outcome of the fetch and parse steps for one detail link
enum LinkOutcome {
    Record(HarvestRecord),
    Cancelled,
}

/// Runs namespaces one at a time against a single fetcher session
pub struct Harvester {
    options: HarvestOptions,
    fetcher: Arc<dyn Fetcher>,
    phase: HarvestPhase,
}

impl Harvester {
    /// Creates a new harvester
    ///
    /// # Arguments
    ///
    /// * `options` - Base URL and page cap
    /// * `fetcher` - Transport shared by every request of the run
    pub fn new(options: HarvestOptions, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            options,
            fetcher,
            phase: HarvestPhase::WarmingUp,
        }
    }

    /// Phase the last run is in, or ended in
    pub fn phase(&self) -> HarvestPhase {
        self.phase
    }

    fn transition(&mut self, next: HarvestPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(&next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Harvests one namespace into `sink`
    ///
    /// Every discovered detail link produces exactly one pushed record: a
    /// [`DetailRecord`](crate::output::DetailRecord) or an [`ErrorRecord`].
    /// Cancelling `cancel` stops the run between records or abandons the
    /// in-flight fetch; the sink is finished either way.
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestSummary)` - The run reached `Done`
    /// * `Err(HarvestError)` - The sink failed; durability can no longer be guaranteed
    pub async fn run(
        &mut self,
        namespace: &str,
        sink: &mut dyn OutputSink,
        cancel: &CancellationToken,
    ) -> Result<HarvestSummary, HarvestError> {
        let started = Instant::now();
        let namespace = namespace.trim().trim_matches('/');
        let mut summary = HarvestSummary::new(namespace);
        let frontier = Frontier::new(self.options.base_url.clone(), namespace, self.options.max_pages)?;

        self.phase = HarvestPhase::WarmingUp;
        tracing::info!("Warming up session for {}", namespace);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => summary.interrupted = true,
            result = self.fetcher.warmup(namespace) => {
                if let Err(e) = result {
                    tracing::warn!("Warmup failed for {}, continuing: {}", namespace, e);
                }
            }
        }

        let mut discovery = Discovery::default();
        if !summary.interrupted {
            self.transition(HarvestPhase::Discovering)?;
            tracing::info!("Discovering listing pages under {}", frontier.root());
            tokio::select! {
                biased;
                _ = cancel.cancelled() => summary.interrupted = true,
                found = frontier.discover(self.fetcher.as_ref()) => discovery = found,
            }
            summary.listing_pages = discovery.listing_pages.len();
            summary.detail_links = discovery.detail_links.len();
            tracing::info!(
                "Found {} listing page(s) and {} detail link(s) for {}",
                summary.listing_pages,
                summary.detail_links,
                namespace
            );
        }

        let referer = namespace_root(&self.options.base_url, namespace);
        for (index, link) in discovery.detail_links.iter().enumerate() {
            if summary.interrupted || cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }
            self.transition(HarvestPhase::Fetching(index))?;

            let record = match self.process_link(link, &referer, cancel).await {
                LinkOutcome::Record(record) => record,
                LinkOutcome::Cancelled => {
                    summary.interrupted = true;
                    break;
                }
            };

            if let Err(e) = sink.push(&record) {
                tracing::error!("{} failed for {}: {}", RecordStep::Emit, link, e);
                return Err(e.into());
            }

            if record.is_error() {
                summary.errors += 1;
            } else {
                summary.records += 1;
            }

            if (index + 1) % 25 == 0 {
                tracing::info!(
                    "Processed {}/{} detail links for {}",
                    index + 1,
                    summary.detail_links,
                    namespace
                );
            }
        }

        if summary.interrupted {
            tracing::warn!(
                "Run for {} interrupted after {} of {} link(s)",
                namespace,
                summary.processed(),
                summary.detail_links
            );
        }

        self.transition(HarvestPhase::Done)?;
        summary.elapsed = started.elapsed();
        sink.finish(&summary)?;

        tracing::info!(
            "Finished {}: {} record(s), {} error(s)",
            namespace,
            summary.records,
            summary.errors
        );
        Ok(summary)
    }

    /// Fetch and parse steps for one detail link
    ///
    /// Failures of either step become an [`ErrorRecord`] for the link.
    async fn process_link(&self, link: &str, referer: &str, cancel: &CancellationToken) -> LinkOutcome {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return LinkOutcome::Cancelled,
            result = self.fetcher.get(link, Some(referer)) => result,
        };

        let html = match fetched {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("{} failed for {}: {}", RecordStep::Fetch, link, e);
                return LinkOutcome::Record(error_record(link, e));
            }
        };

        match parse_detail_page(&html, link) {
            Ok(record) => {
                tracing::debug!("Parsed {} from {}", record.code, link);
                LinkOutcome::Record(record.into())
            }
            Err(e) => {
                tracing::error!("{} failed for {}: {}", RecordStep::Parse, link, e);
                LinkOutcome::Record(error_record(link, e))
            }
        }
    }
}

fn error_record(url: &str, error: impl ToString) -> HarvestRecord {
    ErrorRecord {
        url: url.to_string(),
        error: error.to_string(),
    }
    .into()
}
