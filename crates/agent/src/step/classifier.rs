//! Classifying an action string.
//!
//! Rules are tried in order and the first match wins:
//!
//! 1. `respond: <text>` (case-insensitive, an echoed `Action:` prefix is
//!    tolerated) is a final answer. One pair of quotes around the text is
//!    removed.
//! 2. Text that starts and ends with a double quote is a final answer with
//!    the outer pair removed.
//! 3. Text without a `(` ... `)` pair is plain text and also ends the turn.
//! 4. `identifier(args)` is a tool call.
//! 5. Anything else is an invalid action.

use cardwise_core::error::ToolError;
use regex_lite::Regex;
use std::sync::LazyLock;

static RESPOND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*(?:action\s*:\s*)?respond\s*:\s*(.*)$").expect("respond pattern compiles")
});

static TOOL_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*([A-Za-z_]\w*)\s*\((.*)\)\s*$").expect("tool call pattern compiles")
});

/// What the model asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Reply to the customer and end the turn.
    FinalAnswer(String),
    /// Invoke a tool and keep going.
    ToolCall(ToolInvocation),
    /// Unlabelled prose; treated as the reply.
    PlainText(String),
}

impl Action {
    /// The reply text, if this action ends the turn.
    pub fn answer(&self) -> Option<&str> {
        match self {
            Action::FinalAnswer(text) | Action::PlainText(text) => Some(text),
            Action::ToolCall(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub name: String,
    /// Everything between the outer parentheses, trimmed.
    pub raw_args: String,
}

/// Classify an action string.
pub fn classify(action: &str) -> Result<Action, ToolError> {
    if let Some(caps) = RESPOND.captures(action) {
        let text = caps.get(1).map_or("", |m| m.as_str().trim());
        return Ok(Action::FinalAnswer(strip_quotes(text).to_string()));
    }

    let trimmed = action.trim();
    if let Some(inner) = wrapped_in_quotes(trimmed) {
        return Ok(Action::FinalAnswer(inner.to_string()));
    }

    if !has_paren_pair(trimmed) {
        return Ok(Action::PlainText(trimmed.to_string()));
    }

    if let Some(caps) = TOOL_CALL.captures(trimmed) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let raw_args = caps.get(2).map_or("", |m| m.as_str().trim());
        return Ok(Action::ToolCall(ToolInvocation {
            name: name.to_string(),
            raw_args: raw_args.to_string(),
        }));
    }

    Err(ToolError::InvalidActionFormat {
        action: action.to_string(),
    })
}

/// `"text"`; inner quotes are kept.
fn wrapped_in_quotes(text: &str) -> Option<&str> {
    text.strip_prefix('"')?.strip_suffix('"')
}

fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

fn has_paren_pair(text: &str) -> bool {
    text.find('(')
        .is_some_and(|open| text[open + 1..].contains(')'))
}
