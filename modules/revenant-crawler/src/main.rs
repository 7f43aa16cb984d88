use anyhow::Result;
use std::sync::atomic::Ordering;
use tracing::info;
use tracing_subscriber::EnvFilter;

use revenant_common::Config;
use revenant_crawler::{
    BrowserlessFetcher, ContentExtractor, PageStore, Scheduler, UniformDelay,
};
use wayback_client::CdxClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!(
        domain = config.domain.as_str(),
        db = config.database_path.as_str(),
        out = config.output_dir.as_str(),
        "Revenant crawler starting"
    );

    let store = PageStore::connect(&config.database_path).await?;
    store.ensure_schema().await?;

    let index = CdxClient::new(&config.cdx_endpoint);
    let fetcher = BrowserlessFetcher::new(
        &config.browserless_url,
        config.browserless_token.as_deref(),
    );
    let extractor = ContentExtractor::new(&config.output_dir);

    let scheduler = Scheduler::new(
        index,
        fetcher,
        store,
        extractor,
        UniformDelay::default(),
        &config.domain,
        &config.archive_base,
    );

    // Ctrl-C ends the run after the current URL; already-committed
    // statuses make the next run resume where this one stopped.
    let cancel = scheduler.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let stats = scheduler.run().await?;
    info!("Crawl finished. {stats}");

    Ok(())
}
