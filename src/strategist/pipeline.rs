// SPDX-License-Identifier: MIT

//! Strategy workflow definition
//!
//! ```text
//! [requirements_input -> requirements_agent -(MORE_INPUT)-> requirements_input
//!                                           -(SUMMARY)-> requirements_summary] ->
//! website_data_agent -> consultant_agent -> brand_tuner_agent -> quality_checker_agent
//! quality_checker_agent -(consultant_agent)-> consultant_agent
//!                       -(brand_tuner_agent)-> brand_tuner_agent
//!                       -(FINISH)-> formatter_agent -> save_file_agent -> END
//! ```
//!
//! The bracketed requirements loop is only wired in when a console is
//! supplied.

use crate::adk::agent::TextGenerator;
use crate::adk::error::GraphError;
use crate::strategist::console::Console;
use crate::strategist::nodes::{
    AwaitInputNode, EvaluateRequirementsNode, FormatterNode, QualityCheckNode, SaveFileNode,
    Stage, StrategyAgentNode, SummarizeRequirementsNode, WebsiteDataNode,
};
use crate::strategist::state::{QualityRoute, RequirementsRoute, StrategyField, StrategyState};
use crate::strategist::store::ArtifactStore;
use crate::strategist::tools::fetch::WebFetcher;
use crate::strategist::workflow::graph::{CompiledGraph, StateGraph, Target};
use std::sync::Arc;

pub type StrategyWorkflow = CompiledGraph<StrategyState, Stage>;

/// Collaborators of the requirements loop
pub struct RequirementsDeps {
    pub console: Arc<dyn Console>,
    pub evaluator: Arc<dyn TextGenerator>,
    pub summarizer: Arc<dyn TextGenerator>,
}

/// Everything the workflow's nodes are built from
pub struct WorkflowDeps {
    pub fetcher: Arc<dyn WebFetcher>,
    pub consultant: Arc<dyn TextGenerator>,
    pub brand_tuner: Arc<dyn TextGenerator>,
    pub quality_checker: Arc<dyn TextGenerator>,
    pub formatter: Arc<dyn TextGenerator>,
    pub store: Arc<dyn ArtifactStore>,
    pub requirements: Option<RequirementsDeps>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub max_steps: Option<usize>,
    pub max_correction_rounds: Option<u32>,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            max_steps: Some(50),
            max_correction_rounds: Some(3),
        }
    }
}

/// Build and validate the strategy workflow
pub fn build_workflow(
    deps: WorkflowDeps,
    options: WorkflowOptions,
) -> Result<StrategyWorkflow, GraphError> {
    let mut graph: StateGraph<StrategyState, Stage> = StateGraph::new();

    graph.register(Stage::WebsiteData, WebsiteDataNode::new(deps.fetcher))?;
    graph.register(
        Stage::Consultant,
        StrategyAgentNode::consultant(deps.consultant),
    )?;
    graph.register(
        Stage::BrandTuner,
        StrategyAgentNode::brand_tuner(deps.brand_tuner),
    )?;
    graph.register(
        Stage::QualityChecker,
        QualityCheckNode::new(deps.quality_checker)
            .with_max_correction_rounds(options.max_correction_rounds),
    )?;
    graph.register(Stage::Formatter, FormatterNode::new(deps.formatter))?;
    graph.register(Stage::SaveFile, SaveFileNode::new(deps.store))?;

    match deps.requirements {
        Some(requirements) => {
            graph.register_blocking(Stage::AwaitInput, AwaitInputNode::new(requirements.console))?;
            graph.register(
                Stage::EvaluateRequirements,
                EvaluateRequirementsNode::new(requirements.evaluator),
            )?;
            graph.register(
                Stage::SummarizeRequirements,
                SummarizeRequirementsNode::new(requirements.summarizer),
            )?;

            graph.set_entry(Stage::AwaitInput)?;
            graph.set_inputs([StrategyField::WebsiteLinks]);
            graph.add_edge(Stage::AwaitInput, Stage::EvaluateRequirements)?;
            graph.add_conditional_edge(
                Stage::EvaluateRequirements,
                |state: &StrategyState| state.requirements_route,
                [
                    (RequirementsRoute::MoreInput, Target::Node(Stage::AwaitInput)),
                    (
                        RequirementsRoute::Summary,
                        Target::Node(Stage::SummarizeRequirements),
                    ),
                ],
            )?;
            graph.add_edge(Stage::SummarizeRequirements, Stage::WebsiteData)?;
        }
        None => {
            graph.set_entry(Stage::WebsiteData)?;
            graph.set_inputs([StrategyField::Input, StrategyField::WebsiteLinks]);
        }
    }

    graph.add_edge(Stage::WebsiteData, Stage::Consultant)?;
    graph.add_edge(Stage::Consultant, Stage::BrandTuner)?;
    graph.add_edge(Stage::BrandTuner, Stage::QualityChecker)?;
    graph.add_conditional_edge(
        Stage::QualityChecker,
        |state: &StrategyState| state.next,
        [
            (QualityRoute::Consultant, Target::Node(Stage::Consultant)),
            (QualityRoute::BrandTuner, Target::Node(Stage::BrandTuner)),
            (QualityRoute::Finish, Target::Node(Stage::Formatter)),
        ],
    )?;
    graph.add_edge(Stage::Formatter, Stage::SaveFile)?;
    graph.add_edge(Stage::SaveFile, Target::End)?;

    graph.set_max_steps(options.max_steps);
    graph.compile()
}
