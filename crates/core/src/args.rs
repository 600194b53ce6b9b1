//! Tool argument parsing and coercion.
//!
//! The model writes tool calls as text, e.g. `getCard(42)` or
//! `submitApplication("Jane", "Smith", 95000, 1990-03-22, 1, "Venture X")`.
//! Two argument forms are accepted:
//!
//! - **Named**: the raw argument string is a JSON object,
//!   `{"name": "Jane", "salary": 95000}`. Preferred, since it survives
//!   commas inside values.
//! - **Positional**: comma-separated scalars. Commas inside double-quoted
//!   strings do not split. Each value is trimmed and unquoted.
//!
//! Tools read arguments by position *and* name so either form works.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::ToolError;

/// Parsed tool arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    Positional(Vec<String>),
    Named(Map<String, Value>),
}

impl ToolArgs {
    /// Parse a raw argument string as found between the call parentheses.
    pub fn parse(raw: &str) -> Result<Self, ToolError> {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            let value: Value = serde_json::from_str(trimmed).map_err(|e| {
                ToolError::InvalidArguments(format!("malformed argument object: {e}"))
            })?;
            return match value {
                Value::Object(map) => Ok(Self::Named(map)),
                _ => Err(ToolError::InvalidArguments(
                    "argument object must be a JSON object".into(),
                )),
            };
        }

        if trimmed.is_empty() {
            return Ok(Self::Positional(Vec::new()));
        }

        Ok(Self::Positional(
            split_top_level(trimmed)
                .iter()
                .map(|part| unquote(part.trim()).to_string())
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Positional(values) => values.len(),
            Self::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw text of an argument, looked up by position or by name.
    fn raw(&self, index: usize, name: &str) -> Result<String, ToolError> {
        let found = match self {
            Self::Positional(values) => values.get(index).cloned(),
            Self::Named(map) => map.get(name).and_then(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }),
        };
        found.ok_or_else(|| {
            ToolError::InvalidArguments(format!(
                "missing argument '{name}' (position {})",
                index + 1
            ))
        })
    }

    /// A string argument. Blank values are rejected.
    pub fn string(&self, index: usize, name: &str) -> Result<String, ToolError> {
        let value = self.raw(index, name)?;
        if value.trim().is_empty() {
            return Err(ToolError::InvalidArguments(format!(
                "argument '{name}' must not be empty"
            )));
        }
        Ok(value.trim().to_string())
    }

    /// An integer argument such as a card id.
    pub fn integer(&self, index: usize, name: &str) -> Result<i64, ToolError> {
        let value = self.raw(index, name)?;
        value.trim().parse::<i64>().map_err(|_| {
            ToolError::InvalidArguments(format!(
                "argument '{name}' must be an integer, got \"{value}\""
            ))
        })
    }

    /// A decimal amount. A leading currency sign is tolerated.
    pub fn decimal(&self, index: usize, name: &str) -> Result<Decimal, ToolError> {
        let value = self.raw(index, name)?;
        let cleaned = value.trim().trim_start_matches(['$', '€']).replace('_', "");
        Decimal::from_str(cleaned.trim()).map_err(|_| {
            ToolError::InvalidArguments(format!(
                "argument '{name}' must be a decimal number, got \"{value}\""
            ))
        })
    }

    /// An ISO-8601 calendar date (`YYYY-MM-DD`).
    pub fn date(&self, index: usize, name: &str) -> Result<NaiveDate, ToolError> {
        let value = self.raw(index, name)?;
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
            ToolError::InvalidArguments(format!(
                "argument '{name}' must be a date in YYYY-MM-DD format, got \"{value}\""
            ))
        })
    }
}

/// Split on commas that are not inside a quoted string.
///
/// A single quote only opens a string at the start of a value, so
/// apostrophes in bare values (`O'Brien`) are left alone.
pub fn split_top_level(raw: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut open: Option<char> = None;

    for c in raw.chars() {
        match (open, c) {
            (Some(q), _) if c == q => open = None,
            (None, '"') => open = Some(c),
            (None, '\'') if current.trim().is_empty() => open = Some(c),
            (None, ',') => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts
}

/// Strip one pair of matching surrounding quotes.
pub fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
