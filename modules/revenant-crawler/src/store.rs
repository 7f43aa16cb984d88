// SQLite persistence for per-URL crawl state.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use revenant_common::{PageRecord, PageStatus, Result};

/// Durable mapping of url -> (snapshot timestamp, status), backed by a
/// single-connection SQLite pool. Every write commits before returning.
#[derive(Clone)]
pub struct PageStore {
    pool: SqlitePool,
}

/// Aggregate counts over the pages table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlStats {
    pub total: i64,
    pub pending: i64,
    pub scraped: i64,
    pub error: i64,
}

impl CrawlStats {
    /// Share of processed pages that landed in Scraped, as a percentage.
    pub fn success_pct(&self) -> f64 {
        let processed = self.scraped + self.error;
        if processed == 0 {
            return 0.0;
        }
        self.scraped as f64 * 100.0 / processed as f64
    }
}

impl PageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database file with one connection.
    /// The whole run shares that single connection.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        info!(path, "Opened crawl state database");
        Ok(Self { pool })
    }

    /// Idempotently create the pages table.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pages (
                url TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                status TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a new Pending record for `url`. No-op when a record
    /// already exists: re-seeding never overwrites timestamp or status.
    /// Returns whether a row was actually inserted.
    pub async fn seed(&self, url: &str, timestamp: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO pages (url, timestamp, status) VALUES (?, ?, ?)",
        )
        .bind(url)
        .bind(timestamp)
        .bind(PageStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All records still Pending, in storage order. Queried once at run
    /// start; the snapshot is not refreshed during a run.
    pub async fn list_pending(&self) -> Result<Vec<PageRecord>> {
        let rows = sqlx::query_as::<_, PageRecord>(
            "SELECT url, timestamp, status FROM pages WHERE status = ?",
        )
        .bind(PageStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Update the status of one record. The write is committed before
    /// this returns; a restart never loses an acknowledged transition.
    pub async fn mark_status(&self, url: &str, status: PageStatus) -> Result<()> {
        sqlx::query("UPDATE pages SET status = ? WHERE url = ?")
            .bind(status.as_str())
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Operator action: flip every Error record back to Pending so a
    /// later run picks them up again. The scheduler never calls this.
    pub async fn reset_errors(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE pages SET status = ? WHERE status = ?")
            .bind(PageStatus::Pending.as_str())
            .bind(PageStatus::Error.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// All records in a given status, for the exploration tool.
    pub async fn list_by_status(&self, status: PageStatus) -> Result<Vec<PageRecord>> {
        let rows = sqlx::query_as::<_, PageRecord>(
            "SELECT url, timestamp, status FROM pages WHERE status = ?",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, url: &str) -> Result<Option<PageRecord>> {
        let row = sqlx::query_as::<_, PageRecord>(
            "SELECT url, timestamp, status FROM pages WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn stats(&self) -> Result<CrawlStats> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM pages GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut stats = CrawlStats::default();
        for (status, count) in rows {
            stats.total += count;
            match PageStatus::from_str_loose(&status) {
                PageStatus::Pending => stats.pending += count,
                PageStatus::Scraped => stats.scraped += count,
                PageStatus::Error => stats.error += count,
            }
        }
        Ok(stats)
    }
}
