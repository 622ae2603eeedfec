// SPDX-License-Identifier: MIT

//! Strategy workflow state
//!
//! One [`StrategyState`] exists per run. Nodes return [`StrategyUpdate`]s
//! naming only the fields they produce; the executor folds them in with
//! the reducer table from [`StrategyState::schema`].

use crate::strategist::workflow::state::{
    fold_field, FieldKind, GraphState, Reducer, StateField, StateSchema,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named entry in one of the per-node message sequences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    pub content: String,
}

impl Message {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Speaker names used in the requirements transcript
pub const USER: &str = "user";
pub const ASSISTANT: &str = "requirements_agent";

/// Quality gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityRoute {
    #[serde(rename = "consultant_agent")]
    Consultant,
    #[serde(rename = "brand_tuner_agent")]
    BrandTuner,
    #[serde(rename = "FINISH")]
    Finish,
}

impl QualityRoute {
    pub const ALL: [QualityRoute; 3] = [
        QualityRoute::BrandTuner,
        QualityRoute::Consultant,
        QualityRoute::Finish,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QualityRoute::Consultant => "consultant_agent",
            QualityRoute::BrandTuner => "brand_tuner_agent",
            QualityRoute::Finish => "FINISH",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.label() == label)
    }
}

impl fmt::Display for QualityRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Requirements loop decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementsRoute {
    MoreInput,
    Summary,
}

impl RequirementsRoute {
    pub const ALL: [RequirementsRoute; 2] = [RequirementsRoute::MoreInput, RequirementsRoute::Summary];

    pub fn label(self) -> &'static str {
        match self {
            RequirementsRoute::MoreInput => "MORE_INPUT",
            RequirementsRoute::Summary => "SUMMARY",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.label() == label)
    }
}

impl fmt::Display for RequirementsRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Field names of [`StrategyState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrategyField {
    Input,
    WebsiteLinks,
    RequirementsCompleted,
    Requirements,
    RequirementsRoute,
    WebsiteData,
    Consultant,
    BrandTuner,
    QualityChecker,
    LastConsultant,
    LastBrandTuner,
    LastQualityChecker,
    Feedback,
    Next,
    CorrectionRounds,
    FinalOutput,
}

impl StrategyField {
    pub fn name(self) -> &'static str {
        match self {
            StrategyField::Input => "input",
            StrategyField::WebsiteLinks => "website_links",
            StrategyField::RequirementsCompleted => "requirements_completed",
            StrategyField::Requirements => "requirements",
            StrategyField::RequirementsRoute => "requirements_route",
            StrategyField::WebsiteData => "website_data",
            StrategyField::Consultant => "consultant",
            StrategyField::BrandTuner => "brand_tuner",
            StrategyField::QualityChecker => "quality_checker",
            StrategyField::LastConsultant => "last_consultant",
            StrategyField::LastBrandTuner => "last_brand_tuner",
            StrategyField::LastQualityChecker => "last_quality_checker",
            StrategyField::Feedback => "feedback",
            StrategyField::Next => "next",
            StrategyField::CorrectionRounds => "correction_rounds",
            StrategyField::FinalOutput => "final_output",
        }
    }
}

impl fmt::Display for StrategyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl StateField for StrategyField {
    const ALL: &'static [Self] = &[
        StrategyField::Input,
        StrategyField::WebsiteLinks,
        StrategyField::RequirementsCompleted,
        StrategyField::Requirements,
        StrategyField::RequirementsRoute,
        StrategyField::WebsiteData,
        StrategyField::Consultant,
        StrategyField::BrandTuner,
        StrategyField::QualityChecker,
        StrategyField::LastConsultant,
        StrategyField::LastBrandTuner,
        StrategyField::LastQualityChecker,
        StrategyField::Feedback,
        StrategyField::Next,
        StrategyField::CorrectionRounds,
        StrategyField::FinalOutput,
    ];

    fn kind(self) -> FieldKind {
        match self {
            StrategyField::WebsiteLinks
            | StrategyField::Requirements
            | StrategyField::WebsiteData
            | StrategyField::Consultant
            | StrategyField::BrandTuner
            | StrategyField::QualityChecker => FieldKind::Sequence,
            _ => FieldKind::Scalar,
        }
    }
}

/// Shared state of one strategy run. `Default` is the identity value of
/// every field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    /// Brand brief driving the pipeline
    pub input: String,
    pub website_links: Vec<String>,
    pub requirements_completed: bool,
    /// Requirements-gathering transcript
    pub requirements: Vec<Message>,
    pub requirements_route: Option<RequirementsRoute>,
    pub website_data: Vec<Message>,
    pub consultant: Vec<Message>,
    pub brand_tuner: Vec<Message>,
    pub quality_checker: Vec<Message>,
    pub last_consultant: String,
    pub last_brand_tuner: String,
    /// Raw decision object of the latest quality check
    pub last_quality_checker: String,
    pub feedback: String,
    pub next: Option<QualityRoute>,
    /// Corrections requested by the quality gate so far
    pub correction_rounds: u32,
    pub final_output: String,
}

impl StrategyState {
    /// Initial state for a run with a known brief
    pub fn new(input: impl Into<String>, website_links: Vec<String>) -> Self {
        Self {
            input: input.into(),
            website_links,
            ..Default::default()
        }
    }

    /// Latest question the requirements assistant asked, if any
    pub fn last_question(&self) -> Option<&str> {
        self.requirements
            .iter()
            .rev()
            .find(|m| m.name == ASSISTANT)
            .map(|m| m.content.as_str())
    }

    /// Latest answer the user gave in the requirements loop, if any
    pub fn last_answer(&self) -> Option<&str> {
        self.requirements
            .iter()
            .rev()
            .find(|m| m.name == USER)
            .map(|m| m.content.as_str())
    }

    /// Requirements transcript as `speaker: text` lines
    pub fn transcript(&self) -> String {
        self.requirements
            .iter()
            .map(|m| format!("{}: {}", m.name, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Partial update returned by a node. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyUpdate {
    pub input: Option<String>,
    pub website_links: Option<Vec<String>>,
    pub requirements_completed: Option<bool>,
    pub requirements: Option<Vec<Message>>,
    pub requirements_route: Option<RequirementsRoute>,
    pub website_data: Option<Vec<Message>>,
    pub consultant: Option<Vec<Message>>,
    pub brand_tuner: Option<Vec<Message>>,
    pub quality_checker: Option<Vec<Message>>,
    pub last_consultant: Option<String>,
    pub last_brand_tuner: Option<String>,
    pub last_quality_checker: Option<String>,
    pub feedback: Option<String>,
    pub next: Option<QualityRoute>,
    pub correction_rounds: Option<u32>,
    pub final_output: Option<String>,
}

impl GraphState for StrategyState {
    type Field = StrategyField;
    type Update = StrategyUpdate;

    fn schema() -> StateSchema<StrategyField> {
        use StrategyField as F;
        StateSchema::new()
            .field(F::Input, Reducer::Replace)
            .field(F::WebsiteLinks, Reducer::Replace)
            .field(F::RequirementsCompleted, Reducer::Replace)
            .field(F::Requirements, Reducer::Append)
            .field(F::RequirementsRoute, Reducer::Replace)
            .field(F::WebsiteData, Reducer::Append)
            .field(F::Consultant, Reducer::Append)
            .field(F::BrandTuner, Reducer::Append)
            .field(F::QualityChecker, Reducer::Append)
            .field(F::LastConsultant, Reducer::Replace)
            .field(F::LastBrandTuner, Reducer::Replace)
            .field(F::LastQualityChecker, Reducer::Replace)
            .field(F::Feedback, Reducer::Replace)
            .field(F::Next, Reducer::Replace)
            .field(F::CorrectionRounds, Reducer::Replace)
            .field(F::FinalOutput, Reducer::Replace)
    }

    fn written(update: &StrategyUpdate) -> Vec<StrategyField> {
        use StrategyField as F;
        [
            (F::Input, update.input.is_some()),
            (F::WebsiteLinks, update.website_links.is_some()),
            (F::RequirementsCompleted, update.requirements_completed.is_some()),
            (F::Requirements, update.requirements.is_some()),
            (F::RequirementsRoute, update.requirements_route.is_some()),
            (F::WebsiteData, update.website_data.is_some()),
            (F::Consultant, update.consultant.is_some()),
            (F::BrandTuner, update.brand_tuner.is_some()),
            (F::QualityChecker, update.quality_checker.is_some()),
            (F::LastConsultant, update.last_consultant.is_some()),
            (F::LastBrandTuner, update.last_brand_tuner.is_some()),
            (F::LastQualityChecker, update.last_quality_checker.is_some()),
            (F::Feedback, update.feedback.is_some()),
            (F::Next, update.next.is_some()),
            (F::CorrectionRounds, update.correction_rounds.is_some()),
            (F::FinalOutput, update.final_output.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, present)| present.then_some(field))
        .collect()
    }

    fn apply(&mut self, update: StrategyUpdate, schema: &StateSchema<StrategyField>) {
        use StrategyField as F;
        // Destructured so a new field cannot be silently skipped
        let StrategyUpdate {
            input,
            website_links,
            requirements_completed,
            requirements,
            requirements_route,
            website_data,
            consultant,
            brand_tuner,
            quality_checker,
            last_consultant,
            last_brand_tuner,
            last_quality_checker,
            feedback,
            next,
            correction_rounds,
            final_output,
        } = update;

        fold_field(&mut self.input, input, F::Input, schema);
        fold_field(&mut self.website_links, website_links, F::WebsiteLinks, schema);
        fold_field(
            &mut self.requirements_completed,
            requirements_completed,
            F::RequirementsCompleted,
            schema,
        );
        fold_field(&mut self.requirements, requirements, F::Requirements, schema);
        fold_field(
            &mut self.requirements_route,
            requirements_route.map(Some),
            F::RequirementsRoute,
            schema,
        );
        fold_field(&mut self.website_data, website_data, F::WebsiteData, schema);
        fold_field(&mut self.consultant, consultant, F::Consultant, schema);
        fold_field(&mut self.brand_tuner, brand_tuner, F::BrandTuner, schema);
        fold_field(&mut self.quality_checker, quality_checker, F::QualityChecker, schema);
        fold_field(&mut self.last_consultant, last_consultant, F::LastConsultant, schema);
        fold_field(&mut self.last_brand_tuner, last_brand_tuner, F::LastBrandTuner, schema);
        fold_field(
            &mut self.last_quality_checker,
            last_quality_checker,
            F::LastQualityChecker,
            schema,
        );
        fold_field(&mut self.feedback, feedback, F::Feedback, schema);
        fold_field(&mut self.next, next.map(Some), F::Next, schema);
        fold_field(
            &mut self.correction_rounds,
            correction_rounds,
            F::CorrectionRounds,
            schema,
        );
        fold_field(&mut self.final_output, final_output, F::FinalOutput, schema);
    }
}
