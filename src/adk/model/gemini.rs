// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{ensure_success, Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::env;
use std::sync::Arc;

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
}

impl GeminiModel {
    /// Create a new GeminiModel
    ///
    /// Requires `GOOGLE_API_KEY` environment variable to be set.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key = env::var("GOOGLE_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("GOOGLE_API_KEY".into()))?;
        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
        })
    }

    fn build_body(
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = history
            .iter()
            .filter(|c| c.role != "system")
            .map(|c| {
                let parts: Vec<serde_json::Value> =
                    c.parts.iter().filter_map(part_to_gemini_json).collect();
                json!({ "role": c.role, "parts": parts })
            })
            .collect();

        let mut body = json!({ "contents": contents });

        if let Some(system) = history
            .iter()
            .find(|c| c.role == "system")
            .and_then(|c| c.text_output())
        {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        let mut generation = serde_json::Map::new();
        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                generation.insert("temperature".into(), json!(temp));
            }
            if let Some(max) = cfg.max_output_tokens {
                generation.insert("maxOutputTokens".into(), json!(max));
            }
            if let Some(top_p) = cfg.top_p {
                generation.insert("topP".into(), json!(top_p));
            }
            if let Some(top_k) = cfg.top_k {
                generation.insert("topK".into(), json!(top_k));
            }
            // Gemini has native JSON mode; no forced tool needed
            if let Some(schema) = &cfg.response_schema {
                generation.insert("responseMimeType".into(), json!("application/json"));
                generation.insert("responseSchema".into(), gemini_schema(&schema.parameters));
            }
        }
        if !generation.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(generation);
        }

        let structured = config.is_some_and(|c| c.response_schema.is_some());
        if let Some(tools) = tools.filter(|t| !t.is_empty() && !structured) {
            let function_declarations: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": gemini_schema(t.schema())
                    })
                })
                .collect();

            body["tools"] = json!([{
                "function_declarations": function_declarations
            }]);
        }

        body
    }

    fn parse_response(
        resp_json: &serde_json::Value,
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        let candidate = resp_json["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("no candidates in response".into()))?;

        if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
            log::debug!("Gemini finish reason: {}", finish_reason);
            if finish_reason == "SAFETY" {
                return Err(ModelError::InvalidResponse(
                    "Gemini blocked response due to safety filters".into(),
                ));
            }
        }

        let parts_json = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| {
                ModelError::InvalidResponse(format!("no parts in candidate: {}", candidate))
            })?;

        let mut content = Content {
            role: "model".to_string(),
            parts: parts_json.iter().flat_map(parse_gemini_part).collect(),
        };

        // JSON mode answers in text; surface it the same way the other
        // vendors surface a forced tool call.
        if let Some(schema) = config.and_then(|c| c.response_schema.as_ref()) {
            let text = content.text_output().ok_or_else(|| {
                ModelError::InvalidResponse("empty structured response".into())
            })?;
            let args: serde_json::Value = serde_json::from_str(text.trim()).map_err(|e| {
                ModelError::InvalidResponse(format!("structured response is not JSON: {}", e))
            })?;
            content.parts = vec![Part::FunctionCall {
                name: schema.name.clone(),
                args,
                thought_signature: None,
            }];
        }

        Ok(content)
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, ModelError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model_name, self.api_key
        );

        let body = Self::build_body(history, config, tools);

        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self.client.post(&url).json(&body).send().await?;
        let resp = ensure_success("gemini", resp).await?;
        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        Self::parse_response(&resp_json, config)
    }
}

/// Gemini accepts an OpenAPI subset; drop keys it rejects
fn gemini_schema(schema: &serde_json::Value) -> serde_json::Value {
    match schema {
        serde_json::Value::Object(obj) => serde_json::Value::Object(
            obj.iter()
                .filter(|(k, _)| !matches!(k.as_str(), "additionalProperties" | "$schema" | "title"))
                .map(|(k, v)| (k.clone(), gemini_schema(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(gemini_schema).collect())
        }
        other => other.clone(),
    }
}

/// Serialize a Part to Gemini API JSON format
/// Returns None for parts that shouldn't be sent (e.g., Thinking)
pub fn part_to_gemini_json(part: &Part) -> Option<serde_json::Value> {
    match part {
        Part::Text(t) => Some(json!({ "text": t })),
        Part::Thinking(_) => None,
        Part::FunctionCall {
            name,
            args,
            thought_signature,
        } => {
            let mut fc = json!({ "functionCall": { "name": name, "args": args } });
            if let Some(sig) = thought_signature {
                fc["thoughtSignature"] = json!(sig);
            }
            Some(fc)
        }
        Part::FunctionResponse { name, response } => {
            Some(json!({ "functionResponse": { "name": name, "response": response } }))
        }
    }
}

/// Parse a Gemini API JSON part into Parts
pub fn parse_gemini_part(p: &serde_json::Value) -> Vec<Part> {
    let mut parts = Vec::new();

    if let Some(thought) = p.get("thought").and_then(|t| t.as_str()) {
        if !thought.is_empty() {
            parts.push(Part::Thinking(thought.to_string()));
        }
    }

    if let Some(text) = p["text"].as_str() {
        parts.push(Part::Text(text.to_string()));
    } else if let Some(fc) = p.get("functionCall") {
        parts.push(Part::FunctionCall {
            name: fc["name"].as_str().unwrap_or_default().to_string(),
            args: fc["args"].clone(),
            thought_signature: p
                .get("thoughtSignature")
                .and_then(|s| s.as_str())
                .map(|s| s.to_string()),
        });
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::schema::ResponseSchema;
    use serde_json::json;

    fn structured_config() -> GenerationConfig {
        GenerationConfig {
            response_schema: Some(ResponseSchema::new(
                "route",
                "Pick next",
                json!({
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {"next": {"type": "string"}},
                    "required": ["next"]
                }),
            )),
            ..Default::default()
        }
    }

    #[test]
    fn test_serialize_function_call_with_thought_signature() {
        let part = Part::FunctionCall {
            name: "web_search".to_string(),
            args: json!({"query": "rust"}),
            thought_signature: Some("sig123abc".to_string()),
        };
        let json = part_to_gemini_json(&part).unwrap();

        assert_eq!(json["functionCall"]["name"], "web_search");
        assert_eq!(json["thoughtSignature"], "sig123abc");
    }

    #[test]
    fn test_serialize_thinking_part_returns_none() {
        assert!(part_to_gemini_json(&Part::Thinking("internal".into())).is_none());
    }

    #[test]
    fn test_parse_empty_thought_ignored() {
        let parts = parse_gemini_part(&json!({ "thought": "", "text": "Hello" }));
        assert_eq!(parts.len(), 1);
        assert!(matches!(&parts[0], Part::Text(t) if t == "Hello"));
    }

    #[test]
    fn test_system_message_becomes_system_instruction() {
        let history = [
            Content::text("system", "Be concise"),
            Content::text("user", "hi"),
        ];
        let body = GeminiModel::build_body(&history, None, None);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be concise");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_structured_request_uses_json_mode() {
        let config = structured_config();
        let body = GeminiModel::build_body(&[Content::text("user", "hi")], Some(&config), None);

        let gen = &body["generationConfig"];
        assert_eq!(gen["responseMimeType"], "application/json");
        assert!(gen["responseSchema"].get("additionalProperties").is_none());
        assert_eq!(gen["responseSchema"]["required"], json!(["next"]));
    }

    #[test]
    fn test_structured_response_surfaces_as_function_call() {
        let config = structured_config();
        let resp = json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"next\": \"FINISH\"}"}]},
                "finishReason": "STOP"
            }]
        });

        let content = GeminiModel::parse_response(&resp, Some(&config)).unwrap();
        assert_eq!(content.structured_output("route").unwrap()["next"], "FINISH");
    }

    #[test]
    fn test_safety_block_is_error() {
        let resp = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        assert!(GeminiModel::parse_response(&resp, None).is_err());
    }
}
