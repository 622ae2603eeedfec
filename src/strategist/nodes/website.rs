// SPDX-License-Identifier: MIT

use super::Stage;
use crate::adk::error::StrategistError;
use crate::strategist::state::{Message, StrategyField, StrategyState, StrategyUpdate};
use crate::strategist::tools::fetch::{fetch_all, WebFetcher};
use crate::strategist::workflow::graph::Node;
use async_trait::async_trait;
use std::sync::Arc;

/// Fetches every configured website link concurrently and appends the
/// combined text as one message. Individual fetch failures are recorded
/// inline and never fail the node.
pub struct WebsiteDataNode {
    fetcher: Arc<dyn WebFetcher>,
}

impl WebsiteDataNode {
    pub fn new(fetcher: Arc<dyn WebFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Node<StrategyState> for WebsiteDataNode {
    fn reads(&self) -> &[StrategyField] {
        &[StrategyField::WebsiteLinks]
    }

    fn writes(&self) -> &[StrategyField] {
        &[StrategyField::WebsiteData]
    }

    async fn run(&self, state: &StrategyState) -> Result<StrategyUpdate, StrategistError> {
        let outcomes = fetch_all(Arc::clone(&self.fetcher), &state.website_links).await;
        let fetched = outcomes.iter().filter(|o| o.is_ok()).count();
        log::info!("Fetched {}/{} website pages", fetched, outcomes.len());

        let content = if outcomes.is_empty() {
            "(no website links provided)".to_string()
        } else {
            outcomes
                .iter()
                .map(|o| o.render())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        Ok(StrategyUpdate {
            website_data: Some(vec![Message::new(Stage::WebsiteData.name(), content)]),
            ..Default::default()
        })
    }
}
