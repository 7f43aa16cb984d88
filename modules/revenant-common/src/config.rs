use std::env;

/// Application configuration loaded from environment variables.
/// Constructed once in main and passed down; no ambient globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// Domain whose archived snapshots are being replayed.
    pub domain: String,

    /// SQLite database file holding per-URL crawl state.
    pub database_path: String,

    /// Directory receiving the per-page artifacts (html/json/md).
    pub output_dir: String,

    /// CDX index endpoint.
    pub cdx_endpoint: String,

    /// Base URL of the snapshot archive.
    pub archive_base: String,

    /// Browserless instance used for rendered-page capture.
    pub browserless_url: String,
    pub browserless_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            domain: required_env("REVENANT_DOMAIN"),
            database_path: env::var("REVENANT_DB")
                .unwrap_or_else(|_| "scraper.db".to_string()),
            output_dir: env::var("REVENANT_OUTPUT_DIR")
                .unwrap_or_else(|_| "scraped_data".to_string()),
            cdx_endpoint: env::var("REVENANT_CDX_ENDPOINT")
                .unwrap_or_else(|_| "http://web.archive.org/cdx/search/cdx".to_string()),
            archive_base: env::var("REVENANT_ARCHIVE_BASE")
                .unwrap_or_else(|_| "https://web.archive.org/web".to_string()),
            browserless_url: required_env("BROWSERLESS_URL"),
            browserless_token: env::var("BROWSERLESS_TOKEN").ok(),
        }
    }

    /// Load a minimal config for the exploration tool (no browser needed).
    pub fn explore_from_env() -> Self {
        Self {
            domain: env::var("REVENANT_DOMAIN").unwrap_or_default(),
            database_path: env::var("REVENANT_DB")
                .unwrap_or_else(|_| "scraper.db".to_string()),
            output_dir: env::var("REVENANT_OUTPUT_DIR")
                .unwrap_or_else(|_| "scraped_data".to_string()),
            cdx_endpoint: String::new(),
            archive_base: String::new(),
            browserless_url: String::new(),
            browserless_token: None,
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
