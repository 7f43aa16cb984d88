// End-to-end scheduler scenarios with mock collaborators: no network,
// no browser, no real delays.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use revenant_common::{CrawlError, PageStatus, Result};
use revenant_crawler::{
    ContentExtractor, NoDelay, PageFetcher, PageStore, Scheduler, SnapshotIndex,
};
use wayback_client::collapse_rows;

/// Index mock fed with raw CDX rows, collapsed exactly like the real
/// client.
struct RowsIndex {
    rows: Vec<Vec<String>>,
}

impl RowsIndex {
    fn new(rows: &[(&str, &str)]) -> Self {
        let mut all = vec![vec![
            "urlkey".to_string(),
            "timestamp".to_string(),
            "original".to_string(),
        ]];
        for (timestamp, url) in rows {
            all.push(vec![
                "key".to_string(),
                timestamp.to_string(),
                url.to_string(),
            ]);
        }
        Self { rows: all }
    }
}

#[async_trait]
impl SnapshotIndex for RowsIndex {
    async fn discover(&self, _domain: &str) -> Result<BTreeMap<String, String>> {
        collapse_rows(&self.rows).map_err(|e| CrawlError::Discovery(e.to_string()))
    }
}

/// Index mock that always fails, like an unreachable CDX endpoint.
struct FailingIndex;

#[async_trait]
impl SnapshotIndex for FailingIndex {
    async fn discover(&self, _domain: &str) -> Result<BTreeMap<String, String>> {
        Err(CrawlError::Discovery("connection refused".to_string()))
    }
}

/// Fetcher mock returning canned markup per URL substring, recording
/// every snapshot URL it was asked for.
struct CannedFetcher {
    responses: HashMap<String, std::result::Result<String, String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl CannedFetcher {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn ok(mut self, url_fragment: &str, html: &str) -> Self {
        self.responses
            .insert(url_fragment.to_string(), Ok(html.to_string()));
        self
    }

    fn err(mut self, url_fragment: &str, message: &str) -> Self {
        self.responses
            .insert(url_fragment.to_string(), Err(message.to_string()));
        self
    }

    fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl PageFetcher for CannedFetcher {
    async fn fetch(
        &self,
        snapshot_url: &str,
        _headers: HashMap<String, String>,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(snapshot_url.to_string());
        for (fragment, response) in &self.responses {
            if snapshot_url.contains(fragment) {
                return response
                    .clone()
                    .map_err(CrawlError::Fetch);
            }
        }
        Err(CrawlError::Fetch(format!("no canned response for {snapshot_url}")))
    }
}

async fn test_store() -> PageStore {
    let store = PageStore::connect(":memory:").await.unwrap();
    store.ensure_schema().await.unwrap();
    store
}

fn scheduler_with<I, F>(
    index: I,
    fetcher: F,
    store: PageStore,
    out_dir: &TempDir,
) -> Scheduler<I, F, NoDelay>
where
    I: SnapshotIndex,
    F: PageFetcher,
{
    Scheduler::new(
        index,
        fetcher,
        store,
        ContentExtractor::new(out_dir.path()),
        NoDelay,
        "forum.example.com",
        "https://web.archive.org/web",
    )
}

#[tokio::test]
async fn duplicate_discovery_rows_seed_one_record_with_latest_timestamp() {
    let index = RowsIndex::new(&[
        ("20200101000000", "https://forum.example.com/a"),
        ("20210101000000", "https://forum.example.com/a"),
    ]);
    let fetcher = CannedFetcher::new().ok(
        "forum.example.com/a",
        "<html><head><title>A</title></head><body><p>a</p></body></html>",
    );
    let store = test_store().await;
    let out = TempDir::new().unwrap();

    let scheduler = scheduler_with(index, fetcher, store.clone(), &out);
    let stats = scheduler.run().await.unwrap();

    assert_eq!(stats.discovered, 1);
    assert_eq!(stats.seeded, 1);
    let record = store
        .get("https://forum.example.com/a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.timestamp, "20210101000000");
    assert_eq!(record.status(), PageStatus::Scraped);
}

#[tokio::test]
async fn fetch_failure_is_isolated_to_that_url() {
    let index = RowsIndex::new(&[
        ("20200101000000", "https://forum.example.com/bad"),
        ("20200101000000", "https://forum.example.com/good"),
    ]);
    let fetcher = CannedFetcher::new()
        .err("forum.example.com/bad", "Navigation timed out after 60000ms")
        .ok(
            "forum.example.com/good",
            "<html><head><title>G</title></head><body><p>g</p></body></html>",
        );
    let calls = fetcher.call_log();
    let store = test_store().await;
    let out = TempDir::new().unwrap();

    let scheduler = scheduler_with(index, fetcher, store.clone(), &out);
    let stats = scheduler.run().await.unwrap();

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.scraped, 1);
    assert_eq!(stats.errored, 1);

    // Failed URL is recorded as error and produced no artifacts.
    let bad = store
        .get("https://forum.example.com/bad")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bad.status(), PageStatus::Error);
    let extractor = ContentExtractor::new(out.path());
    let bad_paths = extractor.artifact_paths("https://forum.example.com/bad");
    assert!(!bad_paths.html_path.exists());

    // The failure did not stop the loop: both URLs were attempted.
    assert_eq!(calls.lock().unwrap().len(), 2);
    let good = store
        .get("https://forum.example.com/good")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(good.status(), PageStatus::Scraped);
    let good_paths = extractor.artifact_paths("https://forum.example.com/good");
    assert!(good_paths.html_path.exists());
}

#[tokio::test]
async fn markup_without_title_or_description_yields_empty_metadata() {
    let index = RowsIndex::new(&[("20200101000000", "https://forum.example.com/bare")]);
    let fetcher = CannedFetcher::new().ok(
        "forum.example.com/bare",
        "<html><head></head><body><p>still has a body</p></body></html>",
    );
    let store = test_store().await;
    let out = TempDir::new().unwrap();

    let scheduler = scheduler_with(index, fetcher, store.clone(), &out);
    scheduler.run().await.unwrap();

    let extractor = ContentExtractor::new(out.path());
    let paths = extractor.artifact_paths("https://forum.example.com/bare");
    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.json_path).unwrap()).unwrap();
    assert_eq!(meta["title"], "");
    assert_eq!(meta["description"], "");
    assert!(paths.md_path.exists());
}

#[tokio::test]
async fn discovery_failure_aborts_before_seeding() {
    let store = test_store().await;
    let out = TempDir::new().unwrap();
    let scheduler = scheduler_with(FailingIndex, CannedFetcher::new(), store.clone(), &out);

    let err = scheduler.run().await.unwrap_err();
    assert!(matches!(err, CrawlError::Discovery(_)));
    assert_eq!(store.stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn completed_run_leaves_no_pending_urls_from_its_snapshot() {
    let index = RowsIndex::new(&[
        ("20200101000000", "https://forum.example.com/x"),
        ("20200101000000", "https://forum.example.com/y"),
    ]);
    let fetcher = CannedFetcher::new()
        .ok("forum.example.com/x", "<html><body>x</body></html>")
        .err("forum.example.com/y", "boom");
    let store = test_store().await;
    let out = TempDir::new().unwrap();

    let scheduler = scheduler_with(index, fetcher, store.clone(), &out);
    scheduler.run().await.unwrap();

    assert!(store.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn second_run_does_not_reprocess_terminal_records() {
    let rows = [
        ("20200101000000", "https://forum.example.com/x"),
        ("20200101000000", "https://forum.example.com/y"),
    ];
    let store = test_store().await;
    let out = TempDir::new().unwrap();

    let fetcher = CannedFetcher::new()
        .ok("forum.example.com/x", "<html><body>x</body></html>")
        .err("forum.example.com/y", "boom");
    let scheduler = scheduler_with(RowsIndex::new(&rows), fetcher, store.clone(), &out);
    scheduler.run().await.unwrap();

    // Same discovery output again: statuses are terminal, nothing runs.
    let fetcher = CannedFetcher::new()
        .ok("forum.example.com/x", "<html><body>x</body></html>")
        .err("forum.example.com/y", "boom");
    let calls = fetcher.call_log();
    let scheduler = scheduler_with(RowsIndex::new(&rows), fetcher, store.clone(), &out);
    let stats = scheduler.run().await.unwrap();

    assert_eq!(stats.seeded, 0);
    assert_eq!(stats.processed, 0);
    assert!(calls.lock().unwrap().is_empty());

    let y = store
        .get("https://forum.example.com/y")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(y.status(), PageStatus::Error);
}

#[tokio::test]
async fn reset_errors_makes_error_urls_eligible_again() {
    let rows = [("20200101000000", "https://forum.example.com/flaky")];
    let store = test_store().await;
    let out = TempDir::new().unwrap();

    let fetcher = CannedFetcher::new().err("forum.example.com/flaky", "boom");
    let scheduler = scheduler_with(RowsIndex::new(&rows), fetcher, store.clone(), &out);
    scheduler.run().await.unwrap();
    assert_eq!(store.reset_errors().await.unwrap(), 1);

    let fetcher = CannedFetcher::new().ok(
        "forum.example.com/flaky",
        "<html><body>recovered</body></html>",
    );
    let scheduler = scheduler_with(RowsIndex::new(&rows), fetcher, store.clone(), &out);
    let stats = scheduler.run().await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.scraped, 1);
}

#[tokio::test]
async fn cancellation_before_start_processes_nothing() {
    let rows = [("20200101000000", "https://forum.example.com/x")];
    let fetcher = CannedFetcher::new().ok("forum.example.com/x", "<html></html>");
    let calls = fetcher.call_log();
    let store = test_store().await;
    let out = TempDir::new().unwrap();

    let scheduler = scheduler_with(RowsIndex::new(&rows), fetcher, store.clone(), &out);
    scheduler.cancel_handle().store(true, Ordering::Relaxed);
    let stats = scheduler.run().await.unwrap();

    // Seeding still happened, but no URL was fetched; the record stays
    // Pending for the next run.
    assert_eq!(stats.seeded, 1);
    assert_eq!(stats.processed, 0);
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(store.list_pending().await.unwrap().len(), 1);
}

#[tokio::test]
async fn snapshot_urls_carry_timestamp_and_id_flag() {
    let rows = [("20210615120000", "https://forum.example.com/t/9")];
    let fetcher = CannedFetcher::new().ok("forum.example.com/t/9", "<html></html>");
    let calls = fetcher.call_log();
    let store = test_store().await;
    let out = TempDir::new().unwrap();

    let scheduler = scheduler_with(RowsIndex::new(&rows), fetcher, store, &out);
    scheduler.run().await.unwrap();

    let log = calls.lock().unwrap();
    assert_eq!(
        log.as_slice(),
        ["https://web.archive.org/web/20210615120000id_/https://forum.example.com/t/9"]
    );
}
