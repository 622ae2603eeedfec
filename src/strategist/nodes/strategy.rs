// SPDX-License-Identifier: MIT

//! Consultant and brand-tuner nodes
//!
//! Both produce a strategy text from the brief and whatever feedback the
//! quality gate left. Each execution writes its message sequence and its
//! `last_*` field from the same generation.

use super::Stage;
use crate::adk::agent::TextGenerator;
use crate::adk::error::StrategistError;
use crate::strategist::prompts::{self, render};
use crate::strategist::state::{Message, StrategyField, StrategyState, StrategyUpdate};
use crate::strategist::workflow::graph::Node;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrategyRole {
    Consultant,
    BrandTuner,
}

impl StrategyRole {
    fn stage(self) -> Stage {
        match self {
            StrategyRole::Consultant => Stage::Consultant,
            StrategyRole::BrandTuner => Stage::BrandTuner,
        }
    }
}

pub struct StrategyAgentNode {
    role: StrategyRole,
    generator: Arc<dyn TextGenerator>,
}

impl StrategyAgentNode {
    pub fn consultant(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            role: StrategyRole::Consultant,
            generator,
        }
    }

    pub fn brand_tuner(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            role: StrategyRole::BrandTuner,
            generator,
        }
    }

    fn prompt(&self, state: &StrategyState) -> Result<String, StrategistError> {
        match self.role {
            StrategyRole::Consultant => render(
                prompts::CONSULTANT,
                &[
                    ("input", state.input.as_str()),
                    ("last_consultant", state.last_consultant.as_str()),
                    ("last_brand_tuner", state.last_brand_tuner.as_str()),
                    ("feedback", state.feedback.as_str()),
                ],
            ),
            StrategyRole::BrandTuner => {
                let website_data = state
                    .website_data
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                render(
                    prompts::BRAND_TUNER,
                    &[
                        ("input", state.input.as_str()),
                        ("last_consultant", state.last_consultant.as_str()),
                        ("last_brand_tuner", state.last_brand_tuner.as_str()),
                        ("website_data", website_data.as_str()),
                        ("feedback", state.feedback.as_str()),
                    ],
                )
            }
        }
    }
}

#[async_trait]
impl Node<StrategyState> for StrategyAgentNode {
    fn reads(&self) -> &[StrategyField] {
        match self.role {
            StrategyRole::Consultant => &[StrategyField::Input],
            StrategyRole::BrandTuner => &[
                StrategyField::Input,
                StrategyField::WebsiteData,
                StrategyField::LastConsultant,
            ],
        }
    }

    fn writes(&self) -> &[StrategyField] {
        match self.role {
            StrategyRole::Consultant => &[StrategyField::Consultant, StrategyField::LastConsultant],
            StrategyRole::BrandTuner => &[StrategyField::BrandTuner, StrategyField::LastBrandTuner],
        }
    }

    async fn run(&self, state: &StrategyState) -> Result<StrategyUpdate, StrategistError> {
        let prompt = self.prompt(state)?;
        let text = self.generator.generate_text(&prompt).await?;
        let message = vec![Message::new(self.role.stage().name(), text.clone())];

        Ok(match self.role {
            StrategyRole::Consultant => StrategyUpdate {
                consultant: Some(message),
                last_consultant: Some(text),
                ..Default::default()
            },
            StrategyRole::BrandTuner => StrategyUpdate {
                brand_tuner: Some(message),
                last_brand_tuner: Some(text),
                ..Default::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::agent::Generated;
    use crate::adk::schema::ResponseSchema;
    use std::sync::Mutex;

    /// Answers with a numbered draft and keeps the prompts it saw
    struct DraftStub {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for DraftStub {
        fn name(&self) -> &str {
            "draft"
        }

        async fn generate(
            &self,
            prompt: &str,
            _schema: Option<&ResponseSchema>,
        ) -> Result<Generated, StrategistError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(Generated::Text(format!("draft {}", prompts.len())))
        }
    }

    #[tokio::test]
    async fn test_consultant_updates_message_and_last_together() {
        let gen = Arc::new(DraftStub {
            prompts: Mutex::new(Vec::new()),
        });
        let node = StrategyAgentNode::consultant(gen);
        let state = StrategyState::new("Brand: Acme", vec![]);

        let update = node.run(&state).await.unwrap();
        let message = update.consultant.unwrap();
        assert_eq!(message.len(), 1);
        assert_eq!(message[0].name, "consultant_agent");
        assert_eq!(Some(message[0].content.clone()), update.last_consultant);
        assert!(update.brand_tuner.is_none());
    }

    #[tokio::test]
    async fn test_feedback_reaches_prompt() {
        let gen = Arc::new(DraftStub {
            prompts: Mutex::new(Vec::new()),
        });
        let node = StrategyAgentNode::brand_tuner(gen.clone());
        let state = StrategyState {
            input: "Brand: Acme".into(),
            last_consultant: "draft 1".into(),
            last_brand_tuner: "tuned draft with generic tone".into(),
            feedback: "mention the spring sale".into(),
            website_data: vec![Message::new("website_data_agent", "Acme boots for hikers")],
            ..Default::default()
        };

        let update = node.run(&state).await.unwrap();
        assert_eq!(update.last_brand_tuner.as_deref(), Some("draft 1"));

        let prompt = gen.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("mention the spring sale"));
        assert!(prompt.contains("Acme boots for hikers"));
        assert!(prompt.contains("tuned draft with generic tone"));
    }
}
