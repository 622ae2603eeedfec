// SPDX-License-Identifier: MIT

use crate::adk::error::StrategistError;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that a generator may call while producing text.
///
/// `name()` and `description()` return `&str` and `schema()` returns `&Value`
/// so implementations keep them in struct fields or statics and nothing is
/// cloned per request.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (must be unique within a generator's tool set)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's input parameters
    fn schema(&self) -> &Value;

    /// Execute the tool with the given input and return the result
    async fn execute(&self, input: Value) -> Result<Value, StrategistError>;
}
