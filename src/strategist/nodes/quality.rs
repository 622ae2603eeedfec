// SPDX-License-Identifier: MIT

//! Quality gate
//!
//! Reviews the latest consultant and tuner outputs and names the next
//! step. A correction request past `max_correction_rounds` is recorded but
//! converted into `FINISH`.

use super::{label_of, text_of, Stage};
use crate::adk::agent::TextGenerator;
use crate::adk::error::StrategistError;
use crate::adk::schema::ResponseSchema;
use crate::strategist::prompts::{self, render};
use crate::strategist::state::{
    Message, QualityRoute, StrategyField, StrategyState, StrategyUpdate,
};
use crate::strategist::workflow::graph::Node;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::json;
use std::sync::Arc;

pub static QUALITY_DECISION: Lazy<ResponseSchema> = Lazy::new(|| {
    let routes: Vec<&str> = QualityRoute::ALL.iter().map(|r| r.label()).collect();
    ResponseSchema::new(
        "quality_decision",
        "Route the strategy to the step that must improve it, or finish",
        json!({
            "type": "object",
            "properties": {
                "next": {
                    "type": "string",
                    "enum": routes
                },
                "feedback": {
                    "type": "string",
                    "description": "Concrete instructions for the chosen step"
                }
            },
            "required": ["next", "feedback"]
        }),
    )
});

pub struct QualityCheckNode {
    generator: Arc<dyn TextGenerator>,
    max_correction_rounds: Option<u32>,
}

impl QualityCheckNode {
    /// Unbounded gate; the graph's step limit is the only backstop
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_correction_rounds: None,
        }
    }

    pub fn with_max_correction_rounds(mut self, max: Option<u32>) -> Self {
        self.max_correction_rounds = max;
        self
    }
}

#[async_trait]
impl Node<StrategyState> for QualityCheckNode {
    fn reads(&self) -> &[StrategyField] {
        &[
            StrategyField::Input,
            StrategyField::LastConsultant,
            StrategyField::LastBrandTuner,
        ]
    }

    fn writes(&self) -> &[StrategyField] {
        &[
            StrategyField::QualityChecker,
            StrategyField::LastQualityChecker,
            StrategyField::Feedback,
            StrategyField::Next,
            StrategyField::CorrectionRounds,
        ]
    }

    async fn run(&self, state: &StrategyState) -> Result<StrategyUpdate, StrategistError> {
        let prompt = render(
            prompts::QUALITY_CHECK,
            &[
                ("input", state.input.as_str()),
                ("last_consultant", state.last_consultant.as_str()),
                ("last_brand_tuner", state.last_brand_tuner.as_str()),
                ("feedback", state.feedback.as_str()),
            ],
        )?;
        let decision = self
            .generator
            .generate_structured(&prompt, &QUALITY_DECISION)
            .await?;

        let label = label_of(&decision, "next");
        let requested = QualityRoute::from_label(&label)
            .ok_or_else(|| StrategistError::invalid_route(Stage::QualityChecker.name(), label))?;
        let feedback = text_of(&decision, "feedback");

        let (next, rounds) = match (requested, self.max_correction_rounds) {
            (QualityRoute::Finish, _) => (QualityRoute::Finish, state.correction_rounds),
            (route, Some(max)) if state.correction_rounds >= max => {
                log::warn!(
                    "Quality gate asked for {} after {} corrections; finishing anyway",
                    route,
                    state.correction_rounds
                );
                (QualityRoute::Finish, state.correction_rounds)
            }
            (route, _) => (route, state.correction_rounds + 1),
        };
        log::info!("Quality gate routes to {}", next);

        let raw = decision.to_string();
        Ok(StrategyUpdate {
            quality_checker: Some(vec![Message::new(Stage::QualityChecker.name(), raw.clone())]),
            last_quality_checker: Some(raw),
            feedback: Some(feedback),
            next: Some(next),
            correction_rounds: Some(rounds),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::agent::Generated;
    use serde_json::Value;

    struct FixedDecision(Value);

    #[async_trait]
    impl TextGenerator for FixedDecision {
        fn name(&self) -> &str {
            "checker"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _schema: Option<&ResponseSchema>,
        ) -> Result<Generated, StrategistError> {
            Ok(Generated::Structured(self.0.clone()))
        }
    }

    fn checker(decision: Value, max: Option<u32>) -> QualityCheckNode {
        QualityCheckNode::new(Arc::new(FixedDecision(decision))).with_max_correction_rounds(max)
    }

    #[test]
    fn test_schema_lists_every_route() {
        assert_eq!(
            QUALITY_DECISION.enum_values("next"),
            vec!["brand_tuner_agent", "consultant_agent", "FINISH"]
        );
    }

    #[tokio::test]
    async fn test_correction_counts_round() {
        let node = checker(json!({"next": "consultant_agent", "feedback": "add KPIs"}), None);
        let update = node.run(&StrategyState::default()).await.unwrap();

        assert_eq!(update.next, Some(QualityRoute::Consultant));
        assert_eq!(update.feedback.as_deref(), Some("add KPIs"));
        assert_eq!(update.correction_rounds, Some(1));
        assert!(update.last_quality_checker.unwrap().contains("add KPIs"));
    }

    #[tokio::test]
    async fn test_cap_forces_finish() {
        let node = checker(json!({"next": "brand_tuner_agent", "feedback": "again"}), Some(2));
        let state = StrategyState {
            correction_rounds: 2,
            ..Default::default()
        };

        let update = node.run(&state).await.unwrap();
        assert_eq!(update.next, Some(QualityRoute::Finish));
        assert_eq!(update.feedback.as_deref(), Some("again"));
        assert_eq!(update.correction_rounds, Some(2));
    }

    #[tokio::test]
    async fn test_unknown_label_is_invalid_route() {
        let node = checker(json!({"next": "designer_agent", "feedback": ""}), None);
        let err = node.run(&StrategyState::default()).await.unwrap_err();
        assert!(matches!(
            err,
            StrategistError::InvalidRoute { ref node, ref label }
                if node == "quality_checker_agent" && label == "designer_agent"
        ));
    }
}
