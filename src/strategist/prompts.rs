// SPDX-License-Identifier: MIT

//! Prompt templates
//!
//! Templates use `{{name}}` placeholders filled by [`render`]. Instructions
//! (`*_INSTRUCTION`) become the system message of the generator that owns
//! them; templates become the per-call user prompt.

use crate::adk::error::StrategistError;

pub const REQUIREMENTS_OPENER: &str =
    "Tell me about your brand and what you want this marketing strategy to achieve.";

pub const REQUIREMENTS_INSTRUCTION: &str = "\
You collect the information needed to write a marketing strategy: the brand, \
its products or services, target audience, goals, budget, channels already in \
use and any constraints. Ask one focused question at a time.";

pub const EVALUATE_REQUIREMENTS: &str = "\
Conversation so far:
{{transcript}}

Decide whether enough is known to write a marketing strategy. Answer with \
next = MORE_INPUT and a single follow-up question if something essential is \
missing, or next = SUMMARY with an empty question once it is complete.";

pub const SUMMARIZE_REQUIREMENTS: &str = "\
Conversation:
{{transcript}}

Condense everything the user said into a concise brief for a marketing \
strategist. Keep every concrete fact (brand, audience, goals, budget, \
channels, constraints). Do not invent details.";

pub const CONSULTANT_INSTRUCTION: &str = "\
You are a senior marketing consultant. You write concrete, actionable \
marketing strategies with positioning, audience segments, channels, content \
ideas, budget split and measurable KPIs. Use the available tools to research \
the market and competitors when it helps.";

pub const CONSULTANT: &str = "\
Brief:
{{input}}

Previous strategy draft:
{{last_consultant}}

Previous brand-tuned version:
{{last_brand_tuner}}

Reviewer feedback to address:
{{feedback}}

Write the marketing strategy.";

pub const BRAND_TUNER_INSTRUCTION: &str = "\
You adapt marketing strategies to a brand's existing voice, visual identity \
and offer, as evidenced by its website. Keep the strategy's structure and \
make every recommendation specific to this brand.";

pub const BRAND_TUNER: &str = "\
Brief:
{{input}}

Strategy to adapt:
{{last_consultant}}

Your previous brand-tuned version:
{{last_brand_tuner}}

Website content:
{{website_data}}

Reviewer feedback to address:
{{feedback}}

Rewrite the strategy so it fits the brand.";

pub const QUALITY_CHECK_INSTRUCTION: &str = "\
You review marketing strategies for completeness, specificity and fit with \
the brief. You route work back to the step that must fix it.";

pub const QUALITY_CHECK: &str = "\
Brief:
{{input}}

Consultant strategy:
{{last_consultant}}

Brand-tuned strategy:
{{last_brand_tuner}}

Feedback given last round:
{{feedback}}

Choose next = consultant_agent if the strategy itself is weak, \
brand_tuner_agent if only the brand adaptation needs work, or FINISH if it is \
ready. Put concrete instructions for the chosen step in feedback.";

pub const FORMATTER_INSTRUCTION: &str = "\
You are an editor producing the final client-facing document in markdown.";

pub const FORMATTER: &str = "\
Strategy:
{{last_consultant}}

Brand-tuned strategy:
{{last_brand_tuner}}

Merge both into one polished marketing strategy document with a title, the \
date {{date}}, an executive summary and clear sections. Return only the \
document.";

/// Fill `{{name}}` placeholders from `vars`. Unknown or unclosed
/// placeholders are errors.
pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<String, StrategistError> {
    let mut rendered = String::with_capacity(template.len());
    let mut cursor = template;

    while let Some(start) = cursor.find("{{") {
        rendered.push_str(&cursor[..start]);
        let after_open = &cursor[start + 2..];
        let Some(close) = after_open.find("}}") else {
            return Err(StrategistError::other("unclosed placeholder in template"));
        };
        let key = after_open[..close].trim();
        let value = vars
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
            .ok_or_else(|| StrategistError::other(format!("no value for placeholder '{}'", key)))?;
        rendered.push_str(or_none(value));
        cursor = &after_open[close + 2..];
    }

    rendered.push_str(cursor);
    Ok(rendered)
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() {
        "(none)"
    } else {
        value
    }
}
