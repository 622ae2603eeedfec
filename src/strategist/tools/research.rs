// SPDX-License-Identifier: MIT

use super::fetch::{fetch_all, WebFetcher};
use crate::adk::error::StrategistError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

static RESEARCH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "research_urls": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Pages to read, e.g. competitor sites or articles found by a search"
            }
        },
        "required": ["research_urls"]
    })
});

#[derive(Debug, Deserialize)]
pub struct ResearchArgs {
    pub research_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResearchPage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reads the text of a list of pages through the shared fetcher
pub struct ResearchTool {
    fetcher: Arc<dyn WebFetcher>,
}

impl ResearchTool {
    pub fn new(fetcher: Arc<dyn WebFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Tool for ResearchTool {
    fn name(&self) -> &str {
        "research"
    }

    fn description(&self) -> &str {
        "Fetches the readable text of one or more web pages."
    }

    fn schema(&self) -> &Value {
        &RESEARCH_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, StrategistError> {
        let args: ResearchArgs = serde_json::from_value(input)?;

        let pages: Vec<ResearchPage> = fetch_all(Arc::clone(&self.fetcher), &args.research_urls)
            .await
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(text) => ResearchPage {
                    url: outcome.url,
                    content: Some(text),
                    error: None,
                },
                Err(err) => ResearchPage {
                    url: outcome.url,
                    content: None,
                    error: Some(err),
                },
            })
            .collect();

        Ok(json!({ "pages": pages }))
    }
}
