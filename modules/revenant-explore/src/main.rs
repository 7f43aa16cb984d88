// Read-only operator menu over the crawl state database and the
// artifact directory. Never fetches anything.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use chrono::NaiveDateTime;
use tracing_subscriber::EnvFilter;

use revenant_common::{Config, PageRecord, PageStatus};
use revenant_crawler::{ContentExtractor, PageStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = Config::explore_from_env();
    let store = PageStore::connect(&config.database_path).await?;
    store.ensure_schema().await?;
    let extractor = ContentExtractor::new(&config.output_dir);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!();
        println!("revenant explore — {}", config.database_path);
        println!("  1) list scraped pages");
        println!("  2) list error pages");
        println!("  3) show saved artifacts for a URL");
        println!("  4) statistics");
        println!("  5) reset error pages to pending");
        println!("  0) exit");
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        match line?.trim() {
            "1" => list_pages(&store, PageStatus::Scraped).await?,
            "2" => list_pages(&store, PageStatus::Error).await?,
            "3" => {
                print!("url> ");
                io::stdout().flush()?;
                let Some(url) = lines.next() else { break };
                show_artifacts(&store, &extractor, url?.trim()).await?;
            }
            "4" => show_stats(&store).await?,
            "5" => {
                let reset = store.reset_errors().await?;
                println!("{reset} page(s) reset to pending");
            }
            "0" | "q" | "quit" | "exit" => break,
            other => println!("unknown choice: {other}"),
        }
    }

    Ok(())
}

async fn list_pages(store: &PageStore, status: PageStatus) -> Result<()> {
    let pages = store.list_by_status(status).await?;
    if pages.is_empty() {
        println!("no {status} pages");
        return Ok(());
    }
    for page in &pages {
        println!("{}  {}", describe_timestamp(page), page.url);
    }
    println!("{} page(s)", pages.len());
    Ok(())
}

async fn show_artifacts(
    store: &PageStore,
    extractor: &ContentExtractor,
    url: &str,
) -> Result<()> {
    let Some(record) = store.get(url).await? else {
        println!("no record for {url}");
        return Ok(());
    };
    println!(
        "status: {}   snapshot: {}",
        record.status, describe_timestamp(&record)
    );

    let paths = extractor.artifact_paths(url);
    for path in [&paths.html_path, &paths.json_path, &paths.md_path] {
        let marker = if path.exists() { "" } else { "  (missing)" };
        println!("  {}{marker}", path.display());
    }

    if paths.json_path.exists() {
        let raw = std::fs::read_to_string(&paths.json_path)?;
        let meta: serde_json::Value = serde_json::from_str(&raw)?;
        println!("  title: {}", meta["title"].as_str().unwrap_or(""));
        println!("  description: {}", meta["description"].as_str().unwrap_or(""));
    }
    Ok(())
}

async fn show_stats(store: &PageStore) -> Result<()> {
    let stats = store.stats().await?;
    println!("total:   {}", stats.total);
    println!("scraped: {}", stats.scraped);
    println!("error:   {}", stats.error);
    println!("pending: {}", stats.pending);
    println!("success: {:.1}%", stats.success_pct());
    Ok(())
}

/// Render the 14-digit snapshot timestamp as a readable date, falling
/// back to the raw string for anything unparseable.
fn describe_timestamp(record: &PageRecord) -> String {
    NaiveDateTime::parse_from_str(&record.timestamp, "%Y%m%d%H%M%S")
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| record.timestamp.clone())
}
