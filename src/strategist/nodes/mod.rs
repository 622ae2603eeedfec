// SPDX-License-Identifier: MIT

//! Nodes of the strategy workflow

mod formatter;
mod persist;
mod quality;
mod requirements;
mod strategy;
mod website;

pub use formatter::FormatterNode;
pub use persist::SaveFileNode;
pub use quality::{QualityCheckNode, QUALITY_DECISION};
pub use requirements::{
    is_quit, AwaitInputNode, EvaluateRequirementsNode, SummarizeRequirementsNode,
    REQUIREMENTS_DECISION,
};
pub use strategy::StrategyAgentNode;
pub use website::WebsiteDataNode;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Node identifiers of the strategy workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitInput,
    EvaluateRequirements,
    SummarizeRequirements,
    WebsiteData,
    Consultant,
    BrandTuner,
    QualityChecker,
    Formatter,
    SaveFile,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::AwaitInput => "requirements_input",
            Stage::EvaluateRequirements => "requirements_agent",
            Stage::SummarizeRequirements => "requirements_summary",
            Stage::WebsiteData => "website_data_agent",
            Stage::Consultant => "consultant_agent",
            Stage::BrandTuner => "brand_tuner_agent",
            Stage::QualityChecker => "quality_checker_agent",
            Stage::Formatter => "formatter_agent",
            Stage::SaveFile => "save_file_agent",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Routing label of a decision object, as text for matching and diagnostics
fn label_of(decision: &Value, field: &str) -> String {
    match &decision[field] {
        Value::String(label) => label.trim().to_string(),
        other => other.to_string(),
    }
}

/// String field of a decision object; non-strings are rendered as JSON
fn text_of(decision: &Value, field: &str) -> String {
    match &decision[field] {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
