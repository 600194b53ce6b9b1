//! The two step formats: labeled text and a JSON object.

use regex_lite::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use super::{NO_THOUGHT, ParseFailure, Step, StepParser};

static THINK_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)Think:(.*?)\n?Action:(.*)").expect("think/action pattern compiles")
});

static ACTION_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)Action:(.*)").expect("action pattern compiles"));

const LABELED_FORMAT: &str = "Always respond with exactly these two lines:\n\
Think: <your reasoning about what the customer needs and what to do next>\n\
Action: <one of the following>\n\
  - a tool call, e.g. getCustomerApplications(\"Jane Smith\") or getCard(3)\n\
  - respond: \"<your final message to the customer>\"";

const LABELED_CORRECTION: &str = "Your last response was not in the correct format. \
Please respond with 'Think: ...' and 'Action: ...'.";

/// `Think: ... Action: ...` labeled text.
///
/// The thought may span several lines; the action runs to the end of the
/// output. An `Action:` without a `Think:` is accepted with a placeholder
/// thought.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabeledStepParser;

impl StepParser for LabeledStepParser {
    fn name(&self) -> &str {
        "labeled"
    }

    fn parse(&self, raw: &str) -> Result<Step, ParseFailure> {
        let text = raw.trim();

        let (thought, action) = if let Some(caps) = THINK_ACTION.captures(text) {
            let thought = caps.get(1).map_or("", |m| m.as_str().trim());
            let action = caps.get(2).map_or("", |m| m.as_str().trim());
            (thought.to_string(), action)
        } else if let Some(caps) = ACTION_ONLY.captures(text) {
            let action = caps.get(1).map_or("", |m| m.as_str().trim());
            (NO_THOUGHT.to_string(), action)
        } else {
            return Err(ParseFailure::new("no Action: label"));
        };

        if action.is_empty() {
            return Err(ParseFailure::new("empty action"));
        }

        Ok(Step {
            thought,
            action: action.to_string(),
        })
    }

    fn format_instructions(&self) -> &str {
        LABELED_FORMAT
    }

    fn correction(&self) -> &str {
        LABELED_CORRECTION
    }
}

const JSON_FORMAT: &str = "Always respond with a single JSON object and nothing else:\n\
{\"thought\": \"<your reasoning>\", \"action\": \"<tool call such as getCard(3), \
or respond: <your final message to the customer>>\"}";

const JSON_CORRECTION: &str = "Your last response was not in the correct format. \
Please respond with a single JSON object: {\"thought\": \"...\", \"action\": \"...\"}.";

#[derive(Deserialize)]
struct JsonStep {
    #[serde(default)]
    thought: Option<String>,
    action: String,
}

/// `{"thought": "...", "action": "..."}`, optionally inside a code fence.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStepParser;

impl StepParser for JsonStepParser {
    fn name(&self) -> &str {
        "json"
    }

    fn parse(&self, raw: &str) -> Result<Step, ParseFailure> {
        let body = strip_code_fence(raw.trim());
        let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) else {
            return Err(ParseFailure::new("no JSON object"));
        };
        if end < start {
            return Err(ParseFailure::new("no JSON object"));
        }

        let step: JsonStep = serde_json::from_str(&body[start..=end])
            .map_err(|e| ParseFailure::new(format!("invalid step JSON: {e}")))?;

        let action = step.action.trim();
        if action.is_empty() {
            return Err(ParseFailure::new("empty action"));
        }

        let thought = step
            .thought
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_THOUGHT.to_string());

        Ok(Step {
            thought,
            action: action.to_string(),
        })
    }

    fn format_instructions(&self) -> &str {
        JSON_FORMAT
    }

    fn correction(&self) -> &str {
        JSON_CORRECTION
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (```json)
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
