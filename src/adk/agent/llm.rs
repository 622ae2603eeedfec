// SPDX-License-Identifier: MIT

//! LLM Agent - model-backed text generator with tool calling
//!
//! Free-text requests run a bounded tool loop until the model answers in
//! text. Structured requests bind the response schema and take exactly one
//! model turn.

use super::{Generated, TextGenerator};
use crate::adk::error::{ModelError, StrategistError};
use crate::adk::model::{Content, GenerationConfig, Model, Part};
use crate::adk::retry::{with_retry, RetryConfig};
use crate::adk::schema::ResponseSchema;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_MAX_TURNS: usize = 10;

/// Model-backed generator with optional tools
pub struct LLMAgent {
    pub name: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub config: GenerationConfig,
    pub retry: RetryConfig,
    pub max_turns: usize,
    /// HashMap for O(1) tool lookups
    tool_map: HashMap<String, usize>,
}

impl LLMAgent {
    pub fn new(
        name: String,
        instruction: String,
        model: Arc<dyn Model>,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Self {
        let tool_map: HashMap<String, usize> = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();

        Self {
            name,
            instruction,
            model,
            tools,
            config: GenerationConfig::default(),
            retry: RetryConfig::default(),
            max_turns: DEFAULT_MAX_TURNS,
            tool_map,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// O(1) tool lookup by name
    fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tool_map.get(name).map(|&i| &self.tools[i])
    }

    fn initial_history(&self, prompt: &str) -> Vec<Content> {
        let mut history = Vec::with_capacity(2);
        if !self.instruction.is_empty() {
            history.push(Content::text("system", self.instruction.clone()));
        }
        history.push(Content::text("user", prompt));
        history
    }

    async fn call_model(
        &self,
        history: &[Content],
        config: &GenerationConfig,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, ModelError> {
        with_retry(&self.retry, &self.name, || {
            self.model.generate_content(history, Some(config), tools)
        })
        .await
    }

    async fn run_structured(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
    ) -> Result<Generated, StrategistError> {
        let history = self.initial_history(prompt);
        let config = GenerationConfig {
            response_schema: Some(schema.clone()),
            ..self.config.clone()
        };

        let response = self.call_model(&history, &config, None).await?;

        if let Some(args) = response.structured_output(&schema.name) {
            return Ok(Generated::Structured(args.clone()));
        }
        // Some endpoints ignore the forced tool and answer with JSON text
        match response.text_output() {
            Some(text) => Ok(Generated::Text(text)),
            None => Err(ModelError::InvalidResponse(format!(
                "{} returned neither '{}' nor text",
                self.name, schema.name
            ))
            .into()),
        }
    }

    async fn run_tool_loop(&self, prompt: &str) -> Result<Generated, StrategistError> {
        let mut history = self.initial_history(prompt);

        for turn in 0..self.max_turns {
            log::info!("Agent {} turn {}/{}", self.name, turn + 1, self.max_turns);
            let response = self
                .call_model(&history, &self.config, Some(self.tools.as_slice()))
                .await?;

            let function_calls: Vec<(&str, &serde_json::Value)> = response
                .parts
                .iter()
                .filter_map(|part| match part {
                    Part::FunctionCall { name, args, .. } => Some((name.as_str(), args)),
                    _ => None,
                })
                .collect();

            if function_calls.is_empty() {
                let text = response.text_output().unwrap_or_default();
                if text.is_empty() {
                    log::warn!("Agent {} received an empty response", self.name);
                }
                return Ok(Generated::Text(text));
            }

            let mut function_responses = Vec::with_capacity(function_calls.len());
            for (name, args) in function_calls {
                log::info!("Tool call: {} {}", name, args);

                let tool_response = match self.get_tool(name) {
                    Some(t) => match t.execute(args.clone()).await {
                        Ok(res) => res,
                        Err(e) => {
                            log::error!("Tool {} failed: {}", name, e);
                            serde_json::json!({ "error": e.to_string() })
                        }
                    },
                    None => {
                        log::error!("Tool {} not found", name);
                        serde_json::json!({ "error": format!("Tool {} not found", name) })
                    }
                };

                function_responses.push(Part::FunctionResponse {
                    name: name.to_string(),
                    response: tool_response,
                });
            }

            history.push(response);
            history.push(Content {
                role: "user".to_string(),
                parts: function_responses,
            });
        }

        log::error!(
            "Agent {} reached max turns without text response",
            self.name
        );
        Err(ModelError::InvalidResponse(format!(
            "{} reached {} turns without a text answer",
            self.name, self.max_turns
        ))
        .into())
    }
}

#[async_trait]
impl TextGenerator for LLMAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        schema: Option<&ResponseSchema>,
    ) -> Result<Generated, StrategistError> {
        match schema {
            Some(schema) => self.run_structured(prompt, schema).await,
            None => self.run_tool_loop(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock model that replays scripted responses and records configs.
    /// A `None` entry answers with a rate-limit error.
    struct ScriptedModel {
        responses: Vec<Option<Content>>,
        index: AtomicUsize,
        seen_schema: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Option<Content>>) -> Self {
            Self {
                responses,
                index: AtomicUsize::new(0),
                seen_schema: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Model for ScriptedModel {
        async fn generate_content(
            &self,
            _history: &[Content],
            config: Option<&GenerationConfig>,
            _tools: Option<&[Arc<dyn Tool>]>,
        ) -> Result<Content, ModelError> {
            self.seen_schema.lock().unwrap().push(
                config
                    .and_then(|c| c.response_schema.as_ref())
                    .map(|s| s.name.clone()),
            );
            let idx = self.index.fetch_add(1, Ordering::SeqCst);
            match &self.responses[idx.min(self.responses.len() - 1)] {
                Some(content) => Ok(content.clone()),
                None => Err(ModelError::RateLimited {
                    retry_after_secs: None,
                }),
            }
        }
    }

    struct EchoTool {
        schema: Value,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its input"
        }

        fn schema(&self) -> &Value {
            &self.schema
        }

        async fn execute(&self, input: Value) -> Result<Value, StrategistError> {
            Ok(json!({ "echo": input }))
        }
    }

    fn call(name: &str, args: Value) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                name: name.to_string(),
                args,
                thought_signature: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_text_response() {
        let model = Arc::new(ScriptedModel::new(vec![Some(Content::text("model", "Hello"))]));
        let agent = LLMAgent::new("a".into(), "sys".into(), model, vec![]);

        let out = agent.generate_text("hi").await.unwrap();
        assert_eq!(out, "Hello");
    }

    #[tokio::test]
    async fn test_tool_loop_then_text() {
        let model = Arc::new(ScriptedModel::new(vec![
            Some(call("echo", json!({"q": "acme"}))),
            Some(Content::text("model", "Done researching")),
        ]));
        let tool = Arc::new(EchoTool {
            schema: json!({"type": "object"}),
        });
        let agent = LLMAgent::new("a".into(), "".into(), model.clone(), vec![tool]);

        let out = agent.generate_text("research acme").await.unwrap();
        assert_eq!(out, "Done researching");
        assert_eq!(model.index.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_max_turns_is_error() {
        let model = Arc::new(ScriptedModel::new(vec![Some(call("echo", json!({})))]));
        let tool = Arc::new(EchoTool {
            schema: json!({"type": "object"}),
        });
        let agent = LLMAgent::new("a".into(), "".into(), model, vec![tool]).with_max_turns(3);

        assert!(agent.generate_text("loop").await.is_err());
    }

    #[tokio::test]
    async fn test_structured_binds_schema() {
        let model = Arc::new(ScriptedModel::new(vec![Some(call(
            "route",
            json!({"next": "FINISH", "feedback": "fine"}),
        ))]));
        let agent = LLMAgent::new("checker".into(), "".into(), model.clone(), vec![]);
        let schema = ResponseSchema::new(
            "route",
            "",
            json!({"type": "object", "required": ["next", "feedback"]}),
        );

        let value = agent.generate_structured("check", &schema).await.unwrap();
        assert_eq!(value["next"], "FINISH");
        assert_eq!(
            model.seen_schema.lock().unwrap().as_slice(),
            &[Some("route".to_string())]
        );
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let model = Arc::new(ScriptedModel::new(vec![
            None,
            Some(Content::text("model", "recovered")),
        ]));
        let agent = LLMAgent::new("a".into(), "".into(), model, vec![]).with_retry(RetryConfig {
            max_retries: 1,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
        });

        assert_eq!(agent.generate_text("hi").await.unwrap(), "recovered");
    }
}
