use serde::{Deserialize, Serialize};

/// Capture lifecycle state of a page. Starts at Pending and moves at
/// most once, to Scraped or Error; neither terminal state is ever left
/// by the crawler itself (an operator reset is the only way back).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Pending,
    Scraped,
    Error,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scraped => "scraped",
            Self::Error => "error",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "scraped" => Self::Scraped,
            "error" => Self::Error,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the pages table: a URL, the snapshot version selected
/// for it at seed time, and its capture status.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PageRecord {
    pub url: String,
    pub timestamp: String,
    pub status: String,
}

impl PageRecord {
    pub fn status(&self) -> PageStatus {
        PageStatus::from_str_loose(&self.status)
    }
}

/// Derive the artifact base filename for a URL by replacing the path
/// and query separators with underscores. Not injective: URLs that
/// differ only in the substituted characters collide on the same stem
/// and silently overwrite each other's artifacts. Known behavior,
/// kept as-is.
pub fn artifact_stem(url: &str) -> String {
    url.replace(['/', ':', '?', '&'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [PageStatus::Pending, PageStatus::Scraped, PageStatus::Error] {
            assert_eq!(PageStatus::from_str_loose(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_status_string_is_pending() {
        assert_eq!(PageStatus::from_str_loose("half-done"), PageStatus::Pending);
    }

    #[test]
    fn stem_replaces_separators() {
        assert_eq!(
            artifact_stem("https://forum.example.com/t/intro?page=2&sort=asc"),
            "https___forum.example.com_t_intro_page=2_sort=asc"
        );
    }

    #[test]
    fn stem_is_deterministic_but_lossy() {
        let a = artifact_stem("https://example.com/a/b");
        let b = artifact_stem("https://example.com/a:b");
        assert_eq!(a, artifact_stem("https://example.com/a/b"));
        // Distinct URLs collapsing to one stem is the documented flaw.
        assert_eq!(a, b);
    }
}
