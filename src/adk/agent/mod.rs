// SPDX-License-Identifier: MIT

//! Text-generation capability
//!
//! Every node that talks to a language model depends on [`TextGenerator`]
//! only: one prompt in, either free text or a schema-shaped object out.
//! [`LLMAgent`] is the production implementation, layered over any
//! [`Model`](crate::adk::model::Model) vendor adapter.

mod llm;

pub use llm::LLMAgent;

use crate::adk::error::{ModelError, StrategistError};
use crate::adk::schema::ResponseSchema;
use async_trait::async_trait;
use serde_json::Value;

/// What a generator produced
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Text(String),
    Structured(Value),
}

/// `generate(rendered_prompt, response_schema?) -> text | structured_object`
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the generator name, used in logs
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        schema: Option<&ResponseSchema>,
    ) -> Result<Generated, StrategistError>;

    /// Generate free text
    async fn generate_text(&self, prompt: &str) -> Result<String, StrategistError> {
        match self.generate(prompt, None).await? {
            Generated::Text(text) => Ok(text),
            Generated::Structured(value) => Err(ModelError::InvalidResponse(format!(
                "{} returned an object where text was expected: {}",
                self.name(),
                value
            ))
            .into()),
        }
    }

    /// Generate an object and check it against `schema`'s required fields
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
    ) -> Result<Value, StrategistError> {
        let value = match self.generate(prompt, Some(schema)).await? {
            Generated::Structured(value) => value,
            Generated::Text(text) => serde_json::from_str(text.trim()).map_err(|e| {
                ModelError::InvalidResponse(format!(
                    "{} returned text that is not a '{}' object: {}",
                    self.name(),
                    schema.name,
                    e
                ))
            })?,
        };
        schema.validate(&value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Generator that always answers with the same thing
    struct FixedGenerator(Generated);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _schema: Option<&ResponseSchema>,
        ) -> Result<Generated, StrategistError> {
            Ok(self.0.clone())
        }
    }

    fn schema() -> ResponseSchema {
        ResponseSchema::new(
            "route",
            "",
            json!({"type": "object", "required": ["next", "feedback"]}),
        )
    }

    #[tokio::test]
    async fn test_generate_text() {
        let gen = FixedGenerator(Generated::Text("a strategy".into()));
        assert_eq!(gen.generate_text("p").await.unwrap(), "a strategy");
    }

    #[tokio::test]
    async fn test_generate_text_rejects_object() {
        let gen = FixedGenerator(Generated::Structured(json!({})));
        assert!(gen.generate_text("p").await.is_err());
    }

    #[tokio::test]
    async fn test_structured_accepts_json_text() {
        let gen = FixedGenerator(Generated::Text(
            r#"{"next": "FINISH", "feedback": "ok"}"#.into(),
        ));
        let value = gen.generate_structured("p", &schema()).await.unwrap();
        assert_eq!(value["next"], "FINISH");
    }

    #[tokio::test]
    async fn test_structured_missing_field_is_contract_violation() {
        let gen = FixedGenerator(Generated::Structured(json!({"next": "FINISH"})));
        let err = gen.generate_structured("p", &schema()).await.unwrap_err();
        assert!(matches!(
            err,
            StrategistError::Model(ModelError::SchemaViolation { .. })
        ));
    }
}
