// Content normalization: metadata extraction and per-page artifacts.

use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::info;

use revenant_common::artifact_stem;

/// Metadata record written alongside each captured page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageMeta {
    pub url: String,
    pub title: String,
    pub description: String,
}

/// The three file paths produced for one URL.
#[derive(Debug, Clone)]
pub struct SavedArtifacts {
    pub html_path: PathBuf,
    pub json_path: PathBuf,
    pub md_path: PathBuf,
}

/// Writes raw markup, metadata, and a markdown rendering for each
/// successfully captured page, under one output directory.
pub struct ContentExtractor {
    out_dir: PathBuf,
}

impl ContentExtractor {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Derive the metadata record for a page. Lenient: missing title or
    /// description come back as empty strings, never an error.
    pub fn extract(url: &str, html: &str) -> PageMeta {
        PageMeta {
            url: url.to_string(),
            title: extract_title(html).unwrap_or_default(),
            description: extract_meta_description(html).unwrap_or_default(),
        }
    }

    /// The artifact paths a URL maps to. Deterministic in the URL alone;
    /// the underlying stem transform is lossy across URLs that differ
    /// only in `/ : ? &`.
    pub fn artifact_paths(&self, url: &str) -> SavedArtifacts {
        let stem = artifact_stem(url);
        SavedArtifacts {
            html_path: self.out_dir.join(format!("{stem}.html")),
            json_path: self.out_dir.join(format!("{stem}.json")),
            md_path: self.out_dir.join(format!("{stem}.md")),
        }
    }

    /// Persist the three artifacts for a captured page: the markup
    /// verbatim, the metadata as JSON, and the markdown rendering.
    /// Creates the output directory on demand.
    pub fn save(&self, url: &str, html: &str) -> Result<SavedArtifacts> {
        fs::create_dir_all(&self.out_dir).with_context(|| {
            format!("Failed to create output dir {}", self.out_dir.display())
        })?;

        let paths = self.artifact_paths(url);

        fs::write(&paths.html_path, html)
            .with_context(|| format!("Failed to write {}", paths.html_path.display()))?;

        let meta = Self::extract(url, html);
        let json = serde_json::to_string_pretty(&meta)?;
        fs::write(&paths.json_path, json)
            .with_context(|| format!("Failed to write {}", paths.json_path.display()))?;

        let markdown = html_to_markdown(html.as_bytes(), Some(url));
        fs::write(&paths.md_path, markdown)
            .with_context(|| format!("Failed to write {}", paths.md_path.display()))?;

        info!(url, dir = %self.out_dir.display(), "Saved page artifacts");
        Ok(paths)
    }
}

/// Convert raw HTML bytes into markdown via Readability extraction.
/// Best-effort on malformed markup; empty string when there is no body
/// content to render.
fn html_to_markdown(html: &[u8], url: Option<&str>) -> String {
    let parsed_url = url.and_then(|u| url::Url::parse(u).ok());
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html,
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    transform_content_input(input, &config)
}

/// Simple title extraction from the HTML <title> tag.
fn extract_title(html: &str) -> Option<String> {
    let start = html.find("<title")?.checked_add(6)?;
    let rest = &html[start..];
    let tag_end = rest.find('>')?;
    let after_tag = &rest[tag_end + 1..];
    let end = after_tag.find("</title>")?;
    let title = after_tag[..end].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

static DESC_NAME_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]*name\s*=\s*["']description["'][^>]*content\s*=\s*["']([^"']*)["']"#,
    )
    .expect("valid regex")
});

static DESC_CONTENT_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]*content\s*=\s*["']([^"']*)["'][^>]*name\s*=\s*["']description["']"#,
    )
    .expect("valid regex")
});

/// Trimmed content of <meta name="description">, tolerant of attribute
/// order.
fn extract_meta_description(html: &str) -> Option<String> {
    let cap = DESC_NAME_FIRST
        .captures(html)
        .or_else(|| DESC_CONTENT_FIRST.captures(html))?;
    let value = cap[1].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
