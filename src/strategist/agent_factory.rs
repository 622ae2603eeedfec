// SPDX-License-Identifier: MIT

//! Agent factory - builds the generators behind each workflow stage
//!
//! Every generator shares one model adapter; stages differ in system
//! instruction and tool set.

use crate::adk::agent::{LLMAgent, TextGenerator};
use crate::adk::error::StrategistError;
use crate::adk::model::{GenerationConfig, Model};
use crate::adk::tool::Tool;
use crate::strategist::config::StrategistConfig;
use crate::strategist::console::Console;
use crate::strategist::nodes::Stage;
use crate::strategist::pipeline::{RequirementsDeps, WorkflowDeps};
use crate::strategist::prompts;
use crate::strategist::store::ArtifactStore;
use crate::strategist::tools::fetch::WebFetcher;
use crate::strategist::tools::registry::ToolRegistry;
use std::sync::Arc;

const RESEARCH_TOOLS: &[&str] = &["web_search", "research"];
const NO_TOOLS: &[&str] = &[];

/// Factory for the workflow's text generators
pub struct AgentFactory<'a> {
    registry: &'a ToolRegistry,
    model: Arc<dyn Model>,
    config: &'a StrategistConfig,
}

impl<'a> AgentFactory<'a> {
    pub fn new(registry: &'a ToolRegistry, model: Arc<dyn Model>, config: &'a StrategistConfig) -> Self {
        Self {
            registry,
            model,
            config,
        }
    }

    /// Build the generator for a model-backed stage
    pub async fn build(&self, stage: Stage) -> Result<Arc<dyn TextGenerator>, StrategistError> {
        let (instruction, tool_names): (&str, &[&str]) = match stage {
            Stage::Consultant => (prompts::CONSULTANT_INSTRUCTION, RESEARCH_TOOLS),
            Stage::BrandTuner => (prompts::BRAND_TUNER_INSTRUCTION, RESEARCH_TOOLS),
            Stage::QualityChecker => (prompts::QUALITY_CHECK_INSTRUCTION, NO_TOOLS),
            Stage::Formatter => (prompts::FORMATTER_INSTRUCTION, NO_TOOLS),
            Stage::EvaluateRequirements | Stage::SummarizeRequirements => {
                (prompts::REQUIREMENTS_INSTRUCTION, NO_TOOLS)
            }
            Stage::AwaitInput | Stage::WebsiteData | Stage::SaveFile => {
                return Err(StrategistError::config(format!(
                    "stage {} does not use a generator",
                    stage
                )))
            }
        };

        let tools = self.collect_tools(stage, tool_names).await;
        log::info!("Building agent '{}' with {} tools", stage, tools.len());

        let agent = LLMAgent::new(
            stage.name().to_string(),
            instruction.to_string(),
            Arc::clone(&self.model),
            tools,
        )
        .with_config(GenerationConfig {
            temperature: self.config.model.temperature,
            ..Default::default()
        })
        .with_retry(self.config.retry.clone());

        Ok(Arc::new(agent))
    }

    /// Tools missing from the registry are skipped with a warning
    async fn collect_tools(&self, stage: Stage, names: &[&str]) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
        for name in names {
            match self.registry.get(name).await {
                Some(tool) => tools.push(tool),
                None => log::warn!("Tool '{}' not available for {}", name, stage),
            }
        }
        tools
    }

    /// Assemble the workflow's collaborators. A console enables the
    /// requirements loop.
    pub async fn workflow_deps(
        &self,
        fetcher: Arc<dyn WebFetcher>,
        store: Arc<dyn ArtifactStore>,
        console: Option<Arc<dyn Console>>,
    ) -> Result<WorkflowDeps, StrategistError> {
        let requirements = match console {
            Some(console) => Some(RequirementsDeps {
                console,
                evaluator: self.build(Stage::EvaluateRequirements).await?,
                summarizer: self.build(Stage::SummarizeRequirements).await?,
            }),
            None => None,
        };

        Ok(WorkflowDeps {
            fetcher,
            consultant: self.build(Stage::Consultant).await?,
            brand_tuner: self.build(Stage::BrandTuner).await?,
            quality_checker: self.build(Stage::QualityChecker).await?,
            formatter: self.build(Stage::Formatter).await?,
            store,
            requirements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::ModelError;
    use crate::adk::model::Content;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct SilentModel;

    #[async_trait]
    impl Model for SilentModel {
        async fn generate_content(
            &self,
            _history: &[Content],
            _config: Option<&GenerationConfig>,
            _tools: Option<&[Arc<dyn Tool>]>,
        ) -> Result<Content, ModelError> {
            Ok(Content::text("model", "ok"))
        }
    }

    struct NamedTool(&'static str, Value);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn schema(&self) -> &Value {
            &self.1
        }

        async fn execute(&self, _input: Value) -> Result<Value, StrategistError> {
            Ok(json!({}))
        }
    }

    #[tokio::test]
    async fn test_build_generator_stage() {
        let registry = ToolRegistry::new();
        registry
            .register(Arc::new(NamedTool("research", json!({"type": "object"}))))
            .await;
        let config = StrategistConfig::default();
        let factory = AgentFactory::new(&registry, Arc::new(SilentModel), &config);

        let consultant = factory.build(Stage::Consultant).await.unwrap();
        assert_eq!(consultant.name(), "consultant_agent");
        assert_eq!(consultant.generate_text("p").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_non_generator_stage_rejected() {
        let registry = ToolRegistry::new();
        let config = StrategistConfig::default();
        let factory = AgentFactory::new(&registry, Arc::new(SilentModel), &config);

        assert!(factory.build(Stage::SaveFile).await.is_err());
    }
}
