// Sequential fetch scheduler: seed from discovery, then drain the
// pending queue one URL at a time with randomized politeness delays.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use browserless_client::{BrowserlessClient, ContentOptions, GotoOptions};
use revenant_common::{CrawlError, PageStatus, Result};
use wayback_client::{fingerprint_headers, snapshot_url, CdxClient};

use crate::extract::ContentExtractor;
use crate::store::PageStore;

/// Navigation timeout for a single snapshot capture.
const NAVIGATION_TIMEOUT_MS: u64 = 60_000;

/// Archive index collaborator: everything the scheduler needs from the
/// CDX side.
#[async_trait]
pub trait SnapshotIndex: Send + Sync {
    /// One (url, latest timestamp) pair per literal URL of the domain.
    async fn discover(&self, domain: &str) -> Result<BTreeMap<String, String>>;
}

#[async_trait]
impl SnapshotIndex for CdxClient {
    async fn discover(&self, domain: &str) -> Result<BTreeMap<String, String>> {
        CdxClient::discover(self, domain)
            .await
            .map_err(|e| CrawlError::Discovery(e.to_string()))
    }
}

/// Browser-rendering collaborator: navigate to a snapshot URL with the
/// given request headers and return the rendered markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, snapshot_url: &str, headers: HashMap<String, String>)
        -> Result<String>;
}

/// Production fetcher backed by a Browserless instance.
pub struct BrowserlessFetcher {
    client: BrowserlessClient,
}

impl BrowserlessFetcher {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            client: BrowserlessClient::new(base_url, token),
        }
    }
}

#[async_trait]
impl PageFetcher for BrowserlessFetcher {
    async fn fetch(
        &self,
        snapshot_url: &str,
        headers: HashMap<String, String>,
    ) -> Result<String> {
        let options = ContentOptions {
            headers,
            goto_options: GotoOptions {
                timeout: NAVIGATION_TIMEOUT_MS,
                wait_until: "networkidle2".to_string(),
            },
        };
        self.client
            .content(snapshot_url, &options)
            .await
            .map_err(|e| CrawlError::Fetch(e.to_string()))
    }
}

/// Source of the inter-request politeness pause. Injectable so the
/// pacing policy is testable without real time passing.
pub trait DelaySampler: Send + Sync {
    fn sample(&self) -> Duration;
}

/// Uniformly random delay over [min, max]. The sole admission-control
/// mechanism protecting the archive from burst load.
pub struct UniformDelay {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for UniformDelay {
    fn default() -> Self {
        Self {
            min_secs: 10.0,
            max_secs: 120.0,
        }
    }
}

impl DelaySampler for UniformDelay {
    fn sample(&self) -> Duration {
        let secs = rand::rng().random_range(self.min_secs..=self.max_secs);
        Duration::from_secs_f64(secs)
    }
}

/// Zero delay, for tests and dry runs.
pub struct NoDelay;

impl DelaySampler for NoDelay {
    fn sample(&self) -> Duration {
        Duration::ZERO
    }
}

/// Outcome counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub discovered: usize,
    pub seeded: usize,
    pub processed: usize,
    pub scraped: usize,
    pub errored: usize,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "discovered={} seeded={} processed={} scraped={} errored={}",
            self.discovered, self.seeded, self.processed, self.scraped, self.errored
        )
    }
}

/// The single sequential worker driving the whole capture. One browser
/// session, one database connection, no parallel fetches.
pub struct Scheduler<I, F, D> {
    index: I,
    fetcher: F,
    store: PageStore,
    extractor: ContentExtractor,
    delay: D,
    domain: String,
    archive_base: String,
    cancelled: Arc<AtomicBool>,
}

impl<I, F, D> Scheduler<I, F, D>
where
    I: SnapshotIndex,
    F: PageFetcher,
    D: DelaySampler,
{
    pub fn new(
        index: I,
        fetcher: F,
        store: PageStore,
        extractor: ContentExtractor,
        delay: D,
        domain: &str,
        archive_base: &str,
    ) -> Self {
        Self {
            index,
            fetcher,
            store,
            extractor,
            delay,
            domain: domain.to_string(),
            archive_base: archive_base.to_string(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between per-URL states. Setting it ends the run
    /// cleanly after the current URL; persisted statuses survive, so a
    /// later run resumes from the remaining Pending rows.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Run the capture to completion: discover, seed, then drain the
    /// pending queue. Discovery and persistence failures abort the run;
    /// per-URL fetch failures are recorded and skipped.
    pub async fn run(&self) -> Result<RunStats> {
        let mut stats = RunStats::default();

        // Discovery failure is fatal: nothing is seeded, nothing runs.
        let discovered = self.index.discover(&self.domain).await?;
        stats.discovered = discovered.len();

        for (url, timestamp) in &discovered {
            if self.store.seed(url, timestamp).await? {
                stats.seeded += 1;
            }
        }
        info!(
            discovered = stats.discovered,
            newly_seeded = stats.seeded,
            "Seeding complete"
        );

        // One snapshot of the queue for the whole run; records that
        // reach a terminal status stay excluded on the next run.
        let queue = self.store.list_pending().await?;
        if queue.is_empty() {
            info!("No pending URLs to process");
            return Ok(stats);
        }
        info!(pending = queue.len(), "Processing pending URLs");

        for record in &queue {
            if self.cancelled.load(Ordering::Relaxed) {
                info!("Cancellation requested, ending run");
                break;
            }

            self.capture_one(&record.url, &record.timestamp, &mut stats)
                .await?;

            if self.cancelled.load(Ordering::Relaxed) {
                info!("Cancellation requested, ending run");
                break;
            }

            let pause = self.delay.sample();
            info!(delay_secs = pause.as_secs_f64(), "Waiting before next request");
            tokio::time::sleep(pause).await;
        }

        info!(%stats, "Run complete");
        Ok(stats)
    }

    /// Fetch, extract, and record one URL. Fetch and extraction errors
    /// are absorbed into an Error status; store errors propagate.
    async fn capture_one(
        &self,
        url: &str,
        timestamp: &str,
        stats: &mut RunStats,
    ) -> Result<()> {
        let target = snapshot_url(&self.archive_base, timestamp, url);
        let headers = fingerprint_headers(url, timestamp);
        info!(url, snapshot = %target, "Fetching snapshot");

        let outcome = match self.fetcher.fetch(&target, headers).await {
            Ok(html) => match self.extractor.save(url, &html) {
                Ok(_) => Ok(()),
                Err(e) => Err(CrawlError::Fetch(e.to_string())),
            },
            Err(e) => Err(e),
        };

        stats.processed += 1;
        match outcome {
            Ok(()) => {
                self.store.mark_status(url, PageStatus::Scraped).await?;
                stats.scraped += 1;
                info!(url, "Scraped successfully");
            }
            Err(e) => {
                self.store.mark_status(url, PageStatus::Error).await?;
                stats.errored += 1;
                warn!(url, error = %e, "Capture failed, continuing");
            }
        }

        Ok(())
    }
}
