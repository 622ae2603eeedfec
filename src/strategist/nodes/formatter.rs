// SPDX-License-Identifier: MIT

use crate::adk::agent::TextGenerator;
use crate::adk::error::StrategistError;
use crate::strategist::prompts::{self, render};
use crate::strategist::state::{StrategyField, StrategyState, StrategyUpdate};
use crate::strategist::workflow::graph::Node;
use async_trait::async_trait;
use std::sync::Arc;

/// Merges the latest consultant and tuner outputs into the final document
pub struct FormatterNode {
    generator: Arc<dyn TextGenerator>,
}

impl FormatterNode {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Node<StrategyState> for FormatterNode {
    fn reads(&self) -> &[StrategyField] {
        &[StrategyField::LastConsultant, StrategyField::LastBrandTuner]
    }

    fn writes(&self) -> &[StrategyField] {
        &[StrategyField::FinalOutput]
    }

    async fn run(&self, state: &StrategyState) -> Result<StrategyUpdate, StrategistError> {
        let today = chrono::Local::now().format("%B %-d, %Y").to_string();
        let prompt = render(
            prompts::FORMATTER,
            &[
                ("last_consultant", state.last_consultant.as_str()),
                ("last_brand_tuner", state.last_brand_tuner.as_str()),
                ("date", today.as_str()),
            ],
        )?;
        let document = self.generator.generate_text(&prompt).await?;

        Ok(StrategyUpdate {
            final_output: Some(document),
            ..Default::default()
        })
    }
}
