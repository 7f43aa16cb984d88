/// Result type alias for crawl operations.
pub type Result<T> = std::result::Result<T, CrawlError>;

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The archive index query failed or returned unparseable data.
    /// Fatal: aborts the run before any seeding occurs.
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// Navigation, timeout, or capture failure for a single URL.
    /// Absorbed by the scheduler loop, never surfaced as a run failure.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The durable store is unreachable or rejected a write. Fatal.
    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
