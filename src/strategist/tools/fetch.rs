// SPDX-License-Identifier: MIT

//! Web-content fetching
//!
//! [`fetch_all`] fans out one task per URL and joins them all before
//! returning. A failed URL becomes an error entry in its slot; the batch
//! itself never fails.

use crate::adk::error::StrategistError;
use crate::strategist::config::FetchConfig;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Fetch extracted plain text for a single URL
#[async_trait]
pub trait WebFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, StrategistError>;
}

/// Result of fetching one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub url: String,
    pub result: Result<String, String>,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Section for the aggregated website text, with an inline marker for
    /// failures
    pub fn render(&self) -> String {
        match &self.result {
            Ok(text) => format!("## Source: {}\n\n{}", self.url, text),
            Err(err) => format!("## Source: {}\n\n[fetch failed: {}]", self.url, err),
        }
    }
}

/// Fetch every URL concurrently. Output order matches `urls`, one entry
/// per input. Dropping the returned future aborts in-flight fetches.
pub async fn fetch_all(fetcher: Arc<dyn WebFetcher>, urls: &[String]) -> Vec<FetchOutcome> {
    let mut set = JoinSet::new();
    for (index, url) in urls.iter().enumerate() {
        let fetcher = Arc::clone(&fetcher);
        let url = url.clone();
        set.spawn(async move {
            let result = fetcher.fetch(&url).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<String, String>>> = vec![None; urls.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, Ok(text))) => results[index] = Some(Ok(text)),
            Ok((index, Err(e))) => {
                log::warn!("Fetch failed for {}: {}", urls[index], e);
                results[index] = Some(Err(e.to_string()));
            }
            Err(e) => log::warn!("Fetch task did not complete: {}", e),
        }
    }

    urls.iter()
        .zip(results)
        .map(|(url, result)| FetchOutcome {
            url: url.clone(),
            result: result.unwrap_or_else(|| Err("fetch task did not complete".to_string())),
        })
        .collect()
}

/// Fetches pages over HTTP and reduces them to readable text
pub struct HttpFetcher {
    client: Client,
    max_chars: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, StrategistError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("strategist-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StrategistError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_chars: config.max_chars,
        })
    }
}

#[async_trait]
impl WebFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, StrategistError> {
        let failed = |message: String| StrategistError::Fetch {
            url: url.to_string(),
            message,
        };

        log::debug!("Fetching {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(failed(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = resp.text().await.map_err(|e| failed(e.to_string()))?;
        Ok(extract_text(&body, self.max_chars))
    }
}

static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["nav", "footer", "aside", "script", "style", "header"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect()
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n(\s*\n)+").unwrap());
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\f]+").unwrap());

/// Reduce an HTML page to plain text, at most `max_chars` characters.
/// Navigation, footer, aside, header, script and style blocks are dropped
/// together with their content.
pub fn extract_text(html: &str, max_chars: usize) -> String {
    let mut text = html.to_string();
    for block in BOILERPLATE.iter() {
        text = block.replace_all(&text, " ").into_owned();
    }
    let text = TAG.replace_all(&text, " ");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");

    let text = SPACES.replace_all(&text, " ");
    let text: String = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    let text = text.trim();

    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect()
    } else {
        text.to_string()
    }
}
