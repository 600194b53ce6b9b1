//! Turning raw model output into a structured step.
//!
//! A step is one reasoning unit: a thought and the action the model wants
//! taken. How that is encoded is up to the [`StepParser`]; the controller
//! only sees [`Step`] values and [`ParseFailure`]s.

pub mod classifier;
pub mod parser;

pub use classifier::{Action, ToolInvocation, classify};
pub use parser::{JsonStepParser, LabeledStepParser};

use cardwise_config::StepFormat;
use std::sync::Arc;
use thiserror::Error;

/// Thought shown in the trace when the model only gave an action.
pub const NO_THOUGHT: &str = "(No thought provided)";

/// One parsed model step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub thought: String,
    pub action: String,
}

/// The model output did not follow the response format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse step: {reason}")]
pub struct ParseFailure {
    pub reason: String,
}

impl ParseFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Decodes one model completion into a [`Step`].
pub trait StepParser: Send + Sync {
    /// Short name used in logs and the info endpoint.
    fn name(&self) -> &str;

    fn parse(&self, raw: &str) -> Result<Step, ParseFailure>;

    /// Response format section of the system instructions.
    fn format_instructions(&self) -> &str;

    /// Text recorded in the trace after a [`ParseFailure`] so the next model
    /// call can correct itself.
    fn correction(&self) -> &str;
}

/// The parser matching a configured step format.
pub fn parser_for(format: StepFormat) -> Arc<dyn StepParser> {
    match format {
        StepFormat::Labeled => Arc::new(LabeledStepParser),
        StepFormat::Json => Arc::new(JsonStepParser),
    }
}
