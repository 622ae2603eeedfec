// SPDX-License-Identifier: MIT

//! OpenAI Model - chat completions API implementation
//!
//! Groq and Mistral expose the same wire format, so they reuse this adapter
//! with a different base URL and key.

use super::{ensure_success, Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use crate::adk::schema::ResponseSchema;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::env;
use std::sync::Arc;

/// OpenAI-compatible chat model
pub struct OpenAIModel {
    client: Client,
    provider: String,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Create a new OpenAIModel
    ///
    /// Requires `OPENAI_API_KEY` environment variable to be set.
    /// Optionally uses `OPENAI_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        Self::compatible("openai", "OPENAI_API_KEY", &base_url, model_name)
    }

    /// Create an adapter for an OpenAI-compatible endpoint
    pub fn compatible(
        provider: &str,
        key_var: &str,
        base_url: &str,
        model_name: String,
    ) -> Result<Self, ModelError> {
        let api_key = env::var(key_var).map_err(|_| ModelError::ApiKeyMissing(key_var.into()))?;

        Ok(Self {
            client: Client::new(),
            provider: provider.to_string(),
            api_key,
            model_name,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert internal Content to OpenAI message format
    fn content_to_openai_message(content: &Content) -> serde_json::Value {
        let role = match content.role.as_str() {
            "system" => "system",
            "user" => "user",
            "model" => "assistant",
            other => other,
        };

        for part in &content.parts {
            if let Part::FunctionResponse { name, response } = part {
                return json!({
                    "role": "tool",
                    "tool_call_id": name,
                    "content": serde_json::to_string(response).unwrap_or_default()
                });
            }
        }

        let mut tool_calls = Vec::new();
        let mut text_content = String::new();

        for part in &content.parts {
            match part {
                Part::Text(t) => text_content.push_str(t),
                Part::Thinking(_) => {}
                Part::FunctionCall { name, args, .. } => {
                    tool_calls.push(json!({
                        "id": name,
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": serde_json::to_string(args).unwrap_or_default()
                        }
                    }));
                }
                Part::FunctionResponse { .. } => {}
            }
        }

        if !tool_calls.is_empty() {
            json!({
                "role": role,
                "content": if text_content.is_empty() { serde_json::Value::Null } else { json!(text_content) },
                "tool_calls": tool_calls
            })
        } else {
            json!({
                "role": role,
                "content": text_content
            })
        }
    }

    fn function_spec(name: &str, description: &str, parameters: &serde_json::Value) -> serde_json::Value {
        json!({
            "type": "function",
            "function": {
                "name": name,
                "description": description,
                "parameters": parameters
            }
        })
    }

    /// Build the request body
    fn build_body(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = history
            .iter()
            .map(Self::content_to_openai_message)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        // A response schema is bound as the only tool and forced
        if let Some(schema) = config.and_then(|c| c.response_schema.as_ref()) {
            Self::bind_schema(&mut body, schema);
            return body;
        }

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            let specs: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| Self::function_spec(t.name(), t.description(), t.schema()))
                .collect();
            body["tools"] = json!(specs);
            body["tool_choice"] = json!("auto");
        }

        body
    }

    fn bind_schema(body: &mut serde_json::Value, schema: &ResponseSchema) {
        body["tools"] = json!([Self::function_spec(
            &schema.name,
            &schema.description,
            &schema.parameters
        )]);
        body["tool_choice"] = json!({
            "type": "function",
            "function": { "name": schema.name }
        });
    }

    /// Parse OpenAI response into Content
    fn parse_openai_response(response: &serde_json::Value) -> Result<Content, ModelError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".into()))?;

        let message = &choice["message"];
        let mut parts = Vec::new();

        if let Some(content) = message["content"].as_str() {
            if !content.is_empty() {
                parts.push(Part::Text(content.to_string()));
            }
        }

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            for tc in tool_calls {
                let name = tc["function"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let args_str = tc["function"]["arguments"].as_str().unwrap_or("{}");
                let args: serde_json::Value = serde_json::from_str(args_str).map_err(|e| {
                    ModelError::InvalidResponse(format!("bad arguments for {}: {}", name, e))
                })?;

                parts.push(Part::FunctionCall {
                    name,
                    args,
                    thought_signature: None,
                });
            }
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(history, config, tools);

        log::debug!(
            "{} request body: {}",
            self.provider,
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let resp = ensure_success(&self.provider, resp).await?;
        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("{} response: {}", self.provider, resp_json);

        Self::parse_openai_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_model() -> OpenAIModel {
        OpenAIModel {
            client: Client::new(),
            provider: "groq".to_string(),
            api_key: "test".to_string(),
            model_name: "llama-3.1-70b-versatile".to_string(),
            base_url: "http://localhost".to_string(),
        }
    }

    #[test]
    fn test_content_to_openai_user_message() {
        let msg = OpenAIModel::content_to_openai_message(&Content::text("user", "Hello"));
        assert_eq!(msg["role"], "user");
        assert_eq!(msg["content"], "Hello");
    }

    #[test]
    fn test_content_to_openai_assistant_message() {
        let msg = OpenAIModel::content_to_openai_message(&Content::text("model", "I can help"));
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["content"], "I can help");
    }

    #[test]
    fn test_content_to_openai_with_function_call() {
        let content = Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                name: "web_search".to_string(),
                args: json!({"query": "rust"}),
                thought_signature: None,
            }],
        };

        let msg = OpenAIModel::content_to_openai_message(&content);
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["tool_calls"][0]["function"]["name"], "web_search");
    }

    #[test]
    fn test_response_schema_forces_tool_choice() {
        let schema = ResponseSchema::new(
            "route",
            "Pick the next step",
            json!({"type": "object", "properties": {}, "required": []}),
        );
        let config = GenerationConfig {
            response_schema: Some(schema),
            ..Default::default()
        };

        let body = test_model().build_body(&[Content::text("user", "hi")], Some(&config), None);
        assert_eq!(body["tools"][0]["function"]["name"], "route");
        assert_eq!(body["tool_choice"]["function"]["name"], "route");
        assert_eq!(body["model"], "llama-3.1-70b-versatile");
    }

    #[test]
    fn test_body_without_tools_has_no_tool_choice() {
        let body = test_model().build_body(&[Content::text("user", "hi")], None, None);
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_openai_text_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Hello, how can I help?"
                }
            }]
        });

        let content = OpenAIModel::parse_openai_response(&response).unwrap();
        assert_eq!(content.role, "model");
        assert_eq!(content.text_output().unwrap(), "Hello, how can I help?");
    }

    #[test]
    fn test_parse_openai_function_call_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "route",
                            "arguments": "{\"next\": \"FINISH\", \"feedback\": \"good\"}"
                        }
                    }]
                }
            }]
        });

        let content = OpenAIModel::parse_openai_response(&response).unwrap();
        let args = content.structured_output("route").unwrap();
        assert_eq!(args["next"], "FINISH");
        assert_eq!(args["feedback"], "good");
    }

    #[test]
    fn test_parse_openai_rejects_empty_choices() {
        let result = OpenAIModel::parse_openai_response(&json!({"choices": []}));
        assert!(matches!(result, Err(ModelError::InvalidResponse(_))));
    }
}
