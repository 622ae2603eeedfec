// SPDX-License-Identifier: MIT

//! Model module - defines LLM model trait and implementations
//!
//! This module provides the core Model trait and shared types.
//! Model implementations are in their own submodules:
//! - [anthropic] - Anthropic's Claude API
//! - [gemini] - Google's Gemini API
//! - [openai] - OpenAI's chat completions API, also used for the
//!   OpenAI-compatible Groq and Mistral endpoints

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::adk::error::ModelError;
use crate::adk::schema::ResponseSchema;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    /// Force the reply into this object shape instead of free text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<ResponseSchema>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts, `None` if there are none
    pub fn text_output(&self) -> Option<String> {
        let text: String = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Arguments of the function call named `name`
    pub fn structured_output(&self, name: &str) -> Option<&serde_json::Value> {
        self.parts.iter().find_map(|p| match p {
            Part::FunctionCall { name: n, args, .. } if n == name => Some(args),
            _ => None,
        })
    }
}

/// Parts of a message - text, thinking, function calls, etc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Thinking/reasoning content from thinking models
    Thinking(String),
    /// Function/tool call requested by the model
    FunctionCall {
        name: String,
        args: serde_json::Value,
        /// Thought signature from Gemini thinking models - must be preserved and sent back
        #[serde(skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    /// Response from executing a function/tool
    FunctionResponse {
        name: String,
        response: serde_json::Value,
    },
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, ModelError>;
}

/// Supported model vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
    Gemini,
    Groq,
    Mistral,
}

impl Provider {
    /// Infer the provider from the model name prefix
    pub fn infer_from_model(model_name: &str) -> Self {
        let name = model_name.to_lowercase();
        if name.starts_with("gpt") || name.starts_with("o1") || name.starts_with("o3") {
            Provider::OpenAI
        } else if name.starts_with("claude") {
            Provider::Anthropic
        } else if name.starts_with("gemini") || name.starts_with("models/gemini") {
            Provider::Gemini
        } else if name.starts_with("mistral") || name.starts_with("open-mistral") {
            Provider::Mistral
        } else {
            // llama, mixtral, gemma and friends are served through Groq
            Provider::Groq
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
            Provider::Groq => "groq",
            Provider::Mistral => "mistral",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            "gemini" | "google" => Ok(Provider::Gemini),
            "groq" => Ok(Provider::Groq),
            "mistral" => Ok(Provider::Mistral),
            _ => Err(ModelError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Build the model adapter for `provider`
pub fn create_model(provider: Provider, model_name: String) -> Result<Arc<dyn Model>, ModelError> {
    log::debug!("Using provider '{}' with model '{}'", provider, model_name);
    Ok(match provider {
        Provider::OpenAI => Arc::new(openai::OpenAIModel::new(model_name)?),
        Provider::Groq => Arc::new(openai::OpenAIModel::compatible(
            "groq",
            "GROQ_API_KEY",
            "https://api.groq.com/openai/v1",
            model_name,
        )?),
        Provider::Mistral => Arc::new(openai::OpenAIModel::compatible(
            "mistral",
            "MISTRAL_API_KEY",
            "https://api.mistral.ai/v1",
            model_name,
        )?),
        Provider::Anthropic => Arc::new(anthropic::AnthropicModel::new(model_name)?),
        Provider::Gemini => Arc::new(gemini::GeminiModel::new(model_name)?),
    })
}

/// Turn a non-success response into a ModelError, keeping `Retry-After`
pub(crate) async fn ensure_success(
    provider: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ModelError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let retry_after = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = resp.text().await.unwrap_or_default();
    Err(ModelError::from_status(
        provider,
        status.as_u16(),
        body,
        retry_after,
    ))
}
