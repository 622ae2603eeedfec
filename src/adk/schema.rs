// SPDX-License-Identifier: MIT

//! Structured-output schemas
//!
//! A [`ResponseSchema`] is handed to a model through
//! [`GenerationConfig::response_schema`](crate::adk::model::GenerationConfig).
//! Each vendor adapter binds it its own way (forced tool call, JSON mode);
//! callers only see the object that comes back and [`ResponseSchema::validate`]
//! it against the declared fields. Keys outside `properties` and `required`
//! are rejected.

use crate::adk::error::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON schema for an object the model must return
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseSchema {
    /// Function-style name, used as the forced tool name by vendors that need one
    pub name: String,
    pub description: String,
    /// JSON schema of the object (`type: object`, `properties`, `required`)
    pub parameters: Value,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names listed under `required`
    pub fn required_fields(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|fields| fields.iter().filter_map(|f| f.as_str()).collect())
            .unwrap_or_default()
    }

    /// Allowed values of a string enum property
    pub fn enum_values(&self, field: &str) -> Vec<&str> {
        self.parameters
            .get("properties")
            .and_then(|p| p.get(field))
            .and_then(|f| f.get("enum"))
            .and_then(|e| e.as_array())
            .map(|values| values.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    /// Names declared under `properties`
    pub fn property_names(&self) -> Vec<&str> {
        self.parameters
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Check that `value` is an object whose fields match the schema: every
    /// required field present and non-null, and nothing outside the declared
    /// properties.
    pub fn validate(&self, value: &Value) -> Result<(), ModelError> {
        let obj = value.as_object().ok_or_else(|| {
            ModelError::InvalidResponse(format!(
                "structured output '{}' is not an object: {}",
                self.name, value
            ))
        })?;

        let required = self.required_fields();
        let missing: Vec<String> = required
            .iter()
            .filter(|f| obj.get(**f).map_or(true, Value::is_null))
            .map(|f| f.to_string())
            .collect();

        let declared = self.property_names();
        let mut unexpected: Vec<String> = obj
            .keys()
            .filter(|k| !required.contains(&k.as_str()) && !declared.contains(&k.as_str()))
            .cloned()
            .collect();
        unexpected.sort();

        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(ModelError::SchemaViolation {
                schema: self.name.clone(),
                missing,
                unexpected,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route_schema() -> ResponseSchema {
        ResponseSchema::new(
            "route",
            "Select the next role",
            json!({
                "type": "object",
                "properties": {
                    "next": {"type": "string", "enum": ["a", "b", "FINISH"]},
                    "feedback": {"type": "string"}
                },
                "required": ["next", "feedback"]
            }),
        )
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(route_schema().required_fields(), vec!["next", "feedback"]);
    }

    #[test]
    fn test_enum_values() {
        assert_eq!(route_schema().enum_values("next"), vec!["a", "b", "FINISH"]);
        assert!(route_schema().enum_values("feedback").is_empty());
    }

    #[test]
    fn test_validate_accepts_complete_object() {
        let value = json!({"next": "FINISH", "feedback": "ok"});
        assert!(route_schema().validate(&value).is_ok());
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let value = json!({"next": "a", "feedback": null});
        match route_schema().validate(&value) {
            Err(ModelError::SchemaViolation {
                schema,
                missing,
                unexpected,
            }) => {
                assert_eq!(schema, "route");
                assert_eq!(missing, vec!["feedback".to_string()]);
                assert!(unexpected.is_empty());
            }
            other => panic!("Expected SchemaViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_unknown_fields() {
        let value = json!({"next": "FINISH", "feedback": "ok", "confidence": 0.9});
        match route_schema().validate(&value) {
            Err(ModelError::SchemaViolation {
                missing, unexpected, ..
            }) => {
                assert!(missing.is_empty());
                assert_eq!(unexpected, vec!["confidence".to_string()]);
            }
            other => panic!("Expected SchemaViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let result = route_schema().validate(&json!("FINISH"));
        assert!(matches!(result, Err(ModelError::InvalidResponse(_))));
    }
}
