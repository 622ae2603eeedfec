// SPDX-License-Identifier: MIT

//! Typed error handling for strategist-rs
//!
//! Three layers, from the inside out:
//! - [`ModelError`] - failures talking to a text-generation vendor
//! - [`GraphError`] - graph construction and traversal faults
//! - [`StrategistError`] - everything a run can terminate with

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for strategist-rs
#[derive(Debug, Error)]
pub enum StrategistError {
    /// Graph construction or traversal fault
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Text-generation service failure
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// A structured decision named a routing label outside its declared set
    #[error("Node '{node}' returned invalid route label '{label}'")]
    InvalidRoute { node: String, label: String },

    /// The final artifact could not be written
    #[error("Failed to persist artifact to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single page fetch failed
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Console collaborator failure
    #[error("Console error: {0}")]
    Console(String),

    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was cancelled while a node was in flight
    #[error("Run cancelled")]
    Cancelled,

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Graph construction and execution faults. Always fatal to a run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{0}' is already registered")]
    DuplicateNode(String),

    #[error("Node '{0}' is not registered")]
    UnknownNode(String),

    /// A router produced a label that its edge mapping does not contain
    #[error("Router after '{from}' returned unmapped label '{label}'")]
    Routing { from: String, label: String },

    #[error("Step limit of {limit} exceeded")]
    StepLimitExceeded { limit: usize },

    #[error("No entry point set")]
    MissingEntry,

    #[error("Node '{0}' has no outgoing edge")]
    MissingEdge(String),

    #[error("Node '{0}' already has an outgoing edge")]
    ConflictingEdge(String),

    /// A node reads a field that some path from the entry never writes
    #[error("Node '{node}' reads '{field}', which is not produced on every path reaching it")]
    UnsatisfiedInput { node: String, field: String },

    /// A node's update touched a field outside its declared writes
    #[error("Node '{node}' wrote undeclared field '{field}'")]
    UndeclaredWrite { node: String, field: String },

    #[error("State schema error: {0}")]
    Schema(String),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Provider not supported
    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Non-success status from a vendor API
    #[error("API error from {provider} ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Transport failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// Structured output fields differ from the schema's declared fields
    #[error(
        "Structured output '{schema}' does not match its schema (missing: {missing:?}, unexpected: {unexpected:?})"
    )]
    SchemaViolation {
        schema: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

impl ModelError {
    /// Transport and rate-limit failures are worth another attempt; contract
    /// violations and configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::RateLimited { .. } => true,
            ModelError::Api { status, .. } => *status >= 500,
            ModelError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Map a non-success HTTP status into a ModelError
    pub fn from_status(provider: &str, status: u16, body: String, retry_after: Option<u64>) -> Self {
        if status == 429 {
            ModelError::RateLimited {
                retry_after_secs: retry_after,
            }
        } else {
            ModelError::Api {
                provider: provider.to_string(),
                status,
                message: body,
            }
        }
    }
}

impl StrategistError {
    /// Create an invalid route error
    pub fn invalid_route(node: impl Into<String>, label: impl Into<String>) -> Self {
        Self::InvalidRoute {
            node: node.into(),
            label: label.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = ModelError::from_status("openai", 429, "slow down".into(), Some(2));
        assert!(matches!(
            err,
            ModelError::RateLimited {
                retry_after_secs: Some(2)
            }
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_server_errors_retry_client_errors_do_not() {
        assert!(ModelError::from_status("groq", 503, String::new(), None).is_retryable());
        assert!(!ModelError::from_status("groq", 400, String::new(), None).is_retryable());
    }

    #[test]
    fn test_schema_violation_not_retryable() {
        let err = ModelError::SchemaViolation {
            schema: "route".into(),
            missing: vec!["next".into()],
            unexpected: vec![],
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("next"));
    }

    #[test]
    fn test_invalid_route_names_label() {
        let err = StrategistError::invalid_route("quality_checker_agent", "designer");
        assert_eq!(
            err.to_string(),
            "Node 'quality_checker_agent' returned invalid route label 'designer'"
        );
    }

    #[test]
    fn test_graph_error_converts() {
        let err: StrategistError = GraphError::StepLimitExceeded { limit: 5 }.into();
        assert!(matches!(
            err,
            StrategistError::Graph(GraphError::StepLimitExceeded { limit: 5 })
        ));
    }
}
