pub mod error;
pub mod fingerprint;

pub use error::{Result, WaybackError};
pub use fingerprint::fingerprint_headers;

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::info;

/// Client for the Wayback Machine CDX index.
pub struct CdxClient {
    client: reqwest::Client,
    endpoint: String,
}

impl CdxClient {
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Query the CDX index for every successful (HTTP 200) capture under
    /// `domain/*` and collapse the result to one latest snapshot per
    /// literal URL.
    ///
    /// The index is asked to collapse on its canonical URL key, but that
    /// key can group rows whose literal URL strings differ, so the rows
    /// are re-collapsed here by literal URL. This second pass is
    /// authoritative.
    pub async fn discover(&self, domain: &str) -> Result<BTreeMap<String, String>> {
        info!(domain, "Querying CDX index for archived captures");

        let now = chrono::Utc::now().format("%Y%m%d%H%M%S").to_string();
        let headers = fingerprint_headers(domain, &now);

        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", format!("{domain}/*").as_str()),
                ("output", "json"),
                ("collapse", "urlkey"),
                ("filter", "statuscode:200"),
            ]);
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(WaybackError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let rows: Vec<Vec<String>> = resp
            .json()
            .await
            .map_err(|e| WaybackError::Malformed(e.to_string()))?;

        let total = rows.len().saturating_sub(1);
        let collapsed = collapse_rows(&rows)?;
        info!(
            domain,
            rows = total,
            unique = collapsed.len(),
            "CDX discovery complete"
        );

        Ok(collapsed)
    }
}

/// Collapse CDX rows to one (url, latest timestamp) pair per literal
/// URL. The first row is the column header and is skipped. Timestamps
/// are fixed-width zero-padded decimal strings, so the lexicographic
/// max is the chronological max.
pub fn collapse_rows(rows: &[Vec<String>]) -> Result<BTreeMap<String, String>> {
    let mut latest: BTreeMap<String, String> = BTreeMap::new();

    for row in rows.iter().skip(1) {
        if row.len() < 3 {
            return Err(WaybackError::Malformed(format!(
                "CDX row has {} columns, expected at least 3",
                row.len()
            )));
        }
        let timestamp = &row[1];
        let url = &row[2];

        match latest.get(url) {
            Some(existing) if existing.as_str() >= timestamp.as_str() => {}
            _ => {
                latest.insert(url.clone(), timestamp.clone());
            }
        }
    }

    Ok(latest)
}

/// Compose the snapshot fetch URL for a capture. The `id_` flag asks
/// the archive for the unmodified original document instead of the
/// version wrapped in archive browsing chrome.
pub fn snapshot_url(archive_base: &str, timestamp: &str, url: &str) -> String {
    format!(
        "{}/{timestamp}id_/{url}",
        archive_base.trim_end_matches('/')
    )
}
