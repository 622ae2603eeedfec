// SPDX-License-Identifier: MIT

use crate::adk::error::StrategistError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

// --- Static schema ---

static WEB_SEARCH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The search query"
            },
            "max_results": {
                "type": "integer",
                "description": "Number of results to return (default from config, max 10)"
            }
        },
        "required": ["query"]
    })
});

#[derive(Debug, Serialize, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub results: Vec<SearchResult>,
    pub query: String,
}

/// Web search backed by the Tavily API
pub struct TavilySearchTool {
    client: Client,
    api_key: String,
    max_results: u32,
}

impl TavilySearchTool {
    /// Requires `TAVILY_API_KEY`
    pub fn new(max_results: u32) -> Result<Self, StrategistError> {
        let api_key = env::var("TAVILY_API_KEY")
            .map_err(|_| StrategistError::config("TAVILY_API_KEY must be set"))?;
        Ok(Self {
            client: Client::new(),
            api_key,
            max_results,
        })
    }
}

fn parse_results(body: &Value) -> Result<Vec<SearchResult>, StrategistError> {
    let results = body
        .get("results")
        .ok_or_else(|| StrategistError::other("Invalid response format: missing results"))?;
    Ok(serde_json::from_value(results.clone())?)
}

#[async_trait]
impl Tool for TavilySearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the web. Returns relevant results with titles, URLs, and content snippets."
    }

    fn schema(&self) -> &Value {
        &WEB_SEARCH_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, StrategistError> {
        let args: WebSearchArgs = serde_json::from_value(input)?;
        let max_results = args.max_results.unwrap_or(self.max_results).min(10);

        let resp = self
            .client
            .post(TAVILY_ENDPOINT)
            .json(&json!({
                "api_key": self.api_key,
                "query": args.query,
                "max_results": max_results
            }))
            .send()
            .await
            .map_err(|e| StrategistError::Fetch {
                url: TAVILY_ENDPOINT.to_string(),
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(StrategistError::Fetch {
                url: TAVILY_ENDPOINT.to_string(),
                message: format!("Tavily API error ({}): {}", status, text),
            });
        }

        let body: Value = resp.json().await.map_err(|e| StrategistError::Fetch {
            url: TAVILY_ENDPOINT.to_string(),
            message: e.to_string(),
        })?;

        let result = WebSearchResult {
            results: parse_results(&body)?,
            query: args.query,
        };

        Ok(serde_json::to_value(result)?)
    }
}
