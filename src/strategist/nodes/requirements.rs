// SPDX-License-Identifier: MIT

//! Requirements-gathering loop
//!
//! `requirements_input` asks the user the latest question,
//! `requirements_agent` decides whether to ask again (`MORE_INPUT`) or stop
//! (`SUMMARY`), and `requirements_summary` condenses the transcript into the
//! brief that seeds the rest of the workflow.

use super::{label_of, text_of, Stage};
use crate::adk::agent::TextGenerator;
use crate::adk::error::StrategistError;
use crate::adk::schema::ResponseSchema;
use crate::strategist::console::Console;
use crate::strategist::prompts::{self, render};
use crate::strategist::state::{
    Message, RequirementsRoute, StrategyField, StrategyState, StrategyUpdate, ASSISTANT, USER,
};
use crate::strategist::workflow::graph::{BlockingNode, Node};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::json;
use std::sync::Arc;

const QUIT_WORDS: [&str; 5] = ["quit", "exit", "stop", "q", "done"];

/// Whether a user answer asks to end the interview
pub fn is_quit(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    QUIT_WORDS.contains(&answer.as_str())
}

pub static REQUIREMENTS_DECISION: Lazy<ResponseSchema> = Lazy::new(|| {
    ResponseSchema::new(
        "requirements_decision",
        "Decide whether more information is needed from the user",
        json!({
            "type": "object",
            "properties": {
                "next": {
                    "type": "string",
                    "enum": ["MORE_INPUT", "SUMMARY"]
                },
                "question": {
                    "type": "string",
                    "description": "Follow-up question when next is MORE_INPUT"
                }
            },
            "required": ["next", "question"]
        }),
    )
});

/// Prompts the user on the console and records the raw answer
pub struct AwaitInputNode {
    console: Arc<dyn Console>,
}

impl AwaitInputNode {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

impl BlockingNode<StrategyState> for AwaitInputNode {
    fn writes(&self) -> &[StrategyField] {
        &[StrategyField::Requirements]
    }

    fn run(&self, state: &StrategyState) -> Result<StrategyUpdate, StrategistError> {
        let question = state
            .last_question()
            .unwrap_or(prompts::REQUIREMENTS_OPENER);
        let answer = self.console.prompt(question)?;

        Ok(StrategyUpdate {
            requirements: Some(vec![Message::new(USER, answer)]),
            ..Default::default()
        })
    }
}

pub struct EvaluateRequirementsNode {
    generator: Arc<dyn TextGenerator>,
}

impl EvaluateRequirementsNode {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Node<StrategyState> for EvaluateRequirementsNode {
    fn reads(&self) -> &[StrategyField] {
        &[StrategyField::Requirements]
    }

    fn writes(&self) -> &[StrategyField] {
        &[StrategyField::Requirements, StrategyField::RequirementsRoute]
    }

    async fn run(&self, state: &StrategyState) -> Result<StrategyUpdate, StrategistError> {
        if state.last_answer().is_some_and(is_quit) {
            log::info!("User ended the interview, summarising what we have");
            return Ok(StrategyUpdate {
                requirements_route: Some(RequirementsRoute::Summary),
                ..Default::default()
            });
        }

        let transcript = state.transcript();
        let prompt = render(
            prompts::EVALUATE_REQUIREMENTS,
            &[("transcript", transcript.as_str())],
        )?;
        let decision = self
            .generator
            .generate_structured(&prompt, &REQUIREMENTS_DECISION)
            .await?;

        let label = label_of(&decision, "next");
        let route = RequirementsRoute::from_label(&label)
            .ok_or_else(|| StrategistError::invalid_route(Stage::EvaluateRequirements.name(), label))?;

        let mut update = StrategyUpdate {
            requirements_route: Some(route),
            ..Default::default()
        };

        if route == RequirementsRoute::MoreInput {
            let question = text_of(&decision, "question");
            let question = match question.trim() {
                "" => "Is there anything else I should know about your brand or goals?",
                q => q,
            };
            update.requirements = Some(vec![Message::new(ASSISTANT, question)]);
        }

        Ok(update)
    }
}

pub struct SummarizeRequirementsNode {
    generator: Arc<dyn TextGenerator>,
}

impl SummarizeRequirementsNode {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Node<StrategyState> for SummarizeRequirementsNode {
    fn reads(&self) -> &[StrategyField] {
        &[StrategyField::Requirements]
    }

    fn writes(&self) -> &[StrategyField] {
        &[StrategyField::Input, StrategyField::RequirementsCompleted]
    }

    async fn run(&self, state: &StrategyState) -> Result<StrategyUpdate, StrategistError> {
        let transcript = state.transcript();
        let prompt = render(
            prompts::SUMMARIZE_REQUIREMENTS,
            &[("transcript", transcript.as_str())],
        )?;
        let brief = self.generator.generate_text(&prompt).await?;

        Ok(StrategyUpdate {
            input: Some(brief.trim().to_string()),
            requirements_completed: Some(true),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::agent::Generated;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DecisionStub {
        decision: Value,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for DecisionStub {
        fn name(&self) -> &str {
            "decision"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _schema: Option<&ResponseSchema>,
        ) -> Result<Generated, StrategistError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Generated::Structured(self.decision.clone()))
        }
    }

    fn stub(decision: Value) -> Arc<DecisionStub> {
        Arc::new(DecisionStub {
            decision,
            calls: AtomicUsize::new(0),
        })
    }

    struct EchoConsole {
        answer: &'static str,
        asked: std::sync::Mutex<Vec<String>>,
    }

    impl Console for EchoConsole {
        fn prompt(&self, text: &str) -> Result<String, StrategistError> {
            self.asked.lock().unwrap().push(text.to_string());
            Ok(self.answer.to_string())
        }
    }

    fn answered(answer: &str) -> StrategyState {
        StrategyState {
            requirements: vec![Message::new(USER, answer)],
            ..Default::default()
        }
    }

    #[test]
    fn test_quit_words() {
        for word in ["quit", " Exit ", "STOP", "q", "done"] {
            assert!(is_quit(word), "{} should quit", word);
        }
        assert!(!is_quit("quite a lot of boots"));
    }

    #[test]
    fn test_answer_recorded_verbatim() {
        let console = Arc::new(EchoConsole {
            answer: "  We sell boots \n",
            asked: std::sync::Mutex::new(Vec::new()),
        });
        let node = AwaitInputNode::new(console.clone());

        let update = node.run(&StrategyState::default()).unwrap();
        assert_eq!(
            update.requirements,
            Some(vec![Message::new(USER, "  We sell boots \n")])
        );
        assert_eq!(
            console.asked.lock().unwrap().as_slice(),
            &[prompts::REQUIREMENTS_OPENER]
        );
    }

    #[test]
    fn test_follow_up_question_is_asked() {
        let console = Arc::new(EchoConsole {
            answer: "10k",
            asked: std::sync::Mutex::new(Vec::new()),
        });
        let node = AwaitInputNode::new(console.clone());
        let state = StrategyState {
            requirements: vec![
                Message::new(USER, "We sell boots"),
                Message::new(ASSISTANT, "What is your budget?"),
            ],
            ..Default::default()
        };

        node.run(&state).unwrap();
        assert_eq!(
            console.asked.lock().unwrap().as_slice(),
            &["What is your budget?"]
        );
    }

    #[tokio::test]
    async fn test_padded_quit_skips_model() {
        let gen = stub(json!({"next": "MORE_INPUT", "question": "?"}));
        let node = EvaluateRequirementsNode::new(gen.clone());

        let update = node.run(&answered("  Done \n")).await.unwrap();
        assert_eq!(update.requirements_route, Some(RequirementsRoute::Summary));
        assert_eq!(gen.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_quit_skips_model() {
        let gen = stub(json!({"next": "MORE_INPUT", "question": "?"}));
        let node = EvaluateRequirementsNode::new(gen.clone());

        let update = node.run(&answered("quit")).await.unwrap();
        assert_eq!(update.requirements_route, Some(RequirementsRoute::Summary));
        assert_eq!(gen.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_more_input_appends_question() {
        let gen = stub(json!({"next": "MORE_INPUT", "question": "What is your budget?"}));
        let node = EvaluateRequirementsNode::new(gen);

        let update = node.run(&answered("We sell boots")).await.unwrap();
        assert_eq!(update.requirements_route, Some(RequirementsRoute::MoreInput));
        assert_eq!(
            update.requirements,
            Some(vec![Message::new(ASSISTANT, "What is your budget?")])
        );
    }

    #[tokio::test]
    async fn test_unknown_label_is_invalid_route() {
        let gen = stub(json!({"next": "ASK_MANAGER", "question": ""}));
        let node = EvaluateRequirementsNode::new(gen);

        let err = node.run(&answered("We sell boots")).await.unwrap_err();
        assert!(matches!(
            err,
            StrategistError::InvalidRoute { ref label, .. } if label == "ASK_MANAGER"
        ));
    }
}
