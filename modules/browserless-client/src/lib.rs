pub mod error;

pub use error::{BrowserlessError, Result};

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

/// How long the client waits for the whole /content round trip. Must
/// exceed the navigation timeout passed in goto options.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(90);

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Navigation parameters forwarded to the browser's page.goto call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GotoOptions {
    pub timeout: u64,
    pub wait_until: String,
}

impl Default for GotoOptions {
    fn default() -> Self {
        Self {
            timeout: 60_000,
            wait_until: "networkidle2".to_string(),
        }
    }
}

/// Per-request options for a /content capture.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentOptions {
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(rename = "gotoOptions")]
    pub goto_options: GotoOptions,
}

#[derive(Serialize)]
struct ContentRequest<'a> {
    url: &'a str,
    #[serde(flatten)]
    options: &'a ContentOptions,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    /// Fetch fully-rendered HTML for a URL via the Browserless /content
    /// endpoint, navigating with the given headers and goto options.
    pub async fn content(&self, url: &str, options: &ContentOptions) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = ContentRequest { url, options };

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_goto_options_and_headers() {
        let mut headers = HashMap::new();
        headers.insert("Referer".to_string(), "https://example.com".to_string());
        let options = ContentOptions {
            headers,
            goto_options: GotoOptions::default(),
        };
        let body = ContentRequest {
            url: "https://example.com/page",
            options: &options,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["url"], "https://example.com/page");
        assert_eq!(json["gotoOptions"]["timeout"], 60_000);
        assert_eq!(json["gotoOptions"]["waitUntil"], "networkidle2");
        assert_eq!(json["headers"]["Referer"], "https://example.com");
    }

    #[test]
    fn empty_headers_are_omitted() {
        let options = ContentOptions::default();
        let json = serde_json::to_value(ContentRequest {
            url: "https://example.com",
            options: &options,
        })
        .unwrap();
        assert!(json.get("headers").is_none());
    }
}
