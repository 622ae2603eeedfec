// SPDX-License-Identifier: MIT

//! Anthropic Model - Claude messages API implementation

use super::{ensure_success, Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::env;
use std::sync::Arc;

/// Anthropic Claude model implementation
pub struct AnthropicModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl AnthropicModel {
    /// Create a new AnthropicModel
    ///
    /// Requires `ANTHROPIC_API_KEY` environment variable to be set.
    /// Optionally uses `ANTHROPIC_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("ANTHROPIC_API_KEY".into()))?;
        let base_url = env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    /// Extract system message from history
    fn extract_system_message(history: &[Content]) -> Option<String> {
        history
            .iter()
            .find(|c| c.role == "system")
            .and_then(|c| c.text_output())
    }

    /// Convert internal Content to Anthropic message format
    fn content_to_anthropic_message(content: &Content) -> Option<serde_json::Value> {
        if content.role == "system" {
            return None;
        }

        let role = match content.role.as_str() {
            "user" => "user",
            "model" => "assistant",
            other => other,
        };

        let message_content: Vec<serde_json::Value> = content
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(t) => json!({ "type": "text", "text": t }),
                Part::Thinking(t) => json!({ "type": "thinking", "thinking": t }),
                Part::FunctionCall { name, args, .. } => json!({
                    "type": "tool_use",
                    "id": format!("tool_{}", name),
                    "name": name,
                    "input": args
                }),
                Part::FunctionResponse { name, response } => json!({
                    "type": "tool_result",
                    "tool_use_id": format!("tool_{}", name),
                    "content": serde_json::to_string(response).unwrap_or_default()
                }),
            })
            .collect();

        if message_content.is_empty() {
            return None;
        }

        Some(json!({
            "role": role,
            "content": message_content
        }))
    }

    fn build_body(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = history
            .iter()
            .filter_map(Self::content_to_anthropic_message)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages,
            "max_tokens": config.and_then(|c| c.max_output_tokens).unwrap_or(4096)
        });

        if let Some(sys) = Self::extract_system_message(history) {
            body["system"] = json!(sys);
        }

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
            if let Some(top_k) = cfg.top_k {
                body["top_k"] = json!(top_k);
            }
        }

        if let Some(schema) = config.and_then(|c| c.response_schema.as_ref()) {
            body["tools"] = json!([{
                "name": schema.name,
                "description": schema.description,
                "input_schema": schema.parameters
            }]);
            body["tool_choice"] = json!({ "type": "tool", "name": schema.name });
        } else if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            let specs: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name(),
                        "description": t.description(),
                        "input_schema": t.schema()
                    })
                })
                .collect();
            body["tools"] = json!(specs);
        }

        body
    }

    /// Parse Anthropic response into Content
    fn parse_anthropic_response(response: &serde_json::Value) -> Result<Content, ModelError> {
        let content_blocks = response["content"]
            .as_array()
            .ok_or_else(|| ModelError::InvalidResponse("no content in response".into()))?;

        let mut parts = Vec::new();

        for block in content_blocks {
            match block["type"].as_str() {
                Some("text") => {
                    if let Some(text) = block["text"].as_str().filter(|t| !t.is_empty()) {
                        parts.push(Part::Text(text.to_string()));
                    }
                }
                Some("thinking") => {
                    if let Some(thinking) = block["thinking"].as_str().filter(|t| !t.is_empty()) {
                        parts.push(Part::Thinking(thinking.to_string()));
                    }
                }
                Some("tool_use") => {
                    parts.push(Part::FunctionCall {
                        name: block["name"].as_str().unwrap_or_default().to_string(),
                        args: block["input"].clone(),
                        thought_signature: None,
                    });
                }
                _ => {}
            }
        }

        if let Some(stop_reason) = response["stop_reason"].as_str() {
            log::debug!("Anthropic stop reason: {}", stop_reason);
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

#[async_trait]
impl Model for AnthropicModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, ModelError> {
        let url = format!("{}/messages", self.base_url);
        let body = self.build_body(history, config, tools);

        log::debug!(
            "Anthropic request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let resp = ensure_success("anthropic", resp).await?;
        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("Anthropic response: {}", resp_json);

        Self::parse_anthropic_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::schema::ResponseSchema;
    use serde_json::json;

    fn test_model() -> AnthropicModel {
        AnthropicModel {
            client: Client::new(),
            api_key: "test".to_string(),
            model_name: "claude-3-5-sonnet-latest".to_string(),
            base_url: "http://localhost".to_string(),
        }
    }

    #[test]
    fn test_extract_system_message() {
        let history = vec![
            Content::text("system", "You are a marketing consultant"),
            Content::text("user", "Hello"),
        ];

        let system = AnthropicModel::extract_system_message(&history);
        assert_eq!(system, Some("You are a marketing consultant".to_string()));
    }

    #[test]
    fn test_content_to_anthropic_system_returns_none() {
        let content = Content::text("system", "System prompt");
        assert!(AnthropicModel::content_to_anthropic_message(&content).is_none());
    }

    #[test]
    fn test_content_to_anthropic_with_tool_result() {
        let content = Content {
            role: "user".to_string(),
            parts: vec![Part::FunctionResponse {
                name: "research".to_string(),
                response: json!({"pages": 2}),
            }],
        };

        let msg = AnthropicModel::content_to_anthropic_message(&content).unwrap();
        assert_eq!(msg["content"][0]["type"], "tool_result");
        assert_eq!(msg["content"][0]["tool_use_id"], "tool_research");
    }

    #[test]
    fn test_response_schema_binds_forced_tool() {
        let config = GenerationConfig {
            response_schema: Some(ResponseSchema::new(
                "requirements_route",
                "Decide whether to ask more",
                json!({"type": "object"}),
            )),
            ..Default::default()
        };

        let body = test_model().build_body(
            &[
                Content::text("system", "sys"),
                Content::text("user", "hi"),
            ],
            Some(&config),
            None,
        );

        assert_eq!(body["system"], "sys");
        assert_eq!(body["tool_choice"]["type"], "tool");
        assert_eq!(body["tool_choice"]["name"], "requirements_route");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_anthropic_tool_use_response() {
        let response = json!({
            "content": [{
                "type": "tool_use",
                "id": "tool_123",
                "name": "route",
                "input": {"next": "consultant_agent", "feedback": "too generic"}
            }],
            "stop_reason": "tool_use"
        });

        let content = AnthropicModel::parse_anthropic_response(&response).unwrap();
        let args = content.structured_output("route").unwrap();
        assert_eq!(args["next"], "consultant_agent");
    }

    #[test]
    fn test_parse_anthropic_thinking_response() {
        let response = json!({
            "content": [
                { "type": "thinking", "thinking": "Let me think..." },
                { "type": "text", "text": "The answer is 42" }
            ],
            "stop_reason": "end_turn"
        });

        let content = AnthropicModel::parse_anthropic_response(&response).unwrap();
        assert_eq!(content.parts.len(), 2);
        assert_eq!(content.text_output().unwrap(), "The answer is 42");
    }
}
