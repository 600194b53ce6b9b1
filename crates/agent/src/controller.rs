//! The iteration controller: Think → Act → Observe until the model answers.
//!
//! Each iteration rebuilds the prompt from session state and the turn trace,
//! asks the model for one step, and either dispatches a tool call (whose
//! result or error goes back into the trace) or ends the turn with an answer.
//!
//! # Termination
//!
//! - **Answered**: the model produced a final answer or plain text.
//! - **ModelFailed**: the model call errored, timed out or came back blank.
//!   The turn ends at once with an empty answer.
//! - **BudgetExhausted**: the iteration ceiling was hit. The turn ends with
//!   the configured exhaustion answer (empty by default).
//!
//! Format errors and tool errors never end a turn. They are recorded in the
//! trace and cost one iteration each.

use cardwise_core::error::ProviderError;
use cardwise_core::event::{DomainEvent, EventBus};
use cardwise_core::provider::{Provider, ProviderRequest};
use cardwise_core::session::Session;
use cardwise_core::tool::ToolRegistry;
use cardwise_core::trace::Trace;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::context::prompt::{PromptBuilder, system_instructions};
use crate::step::{Action, StepParser, ToolInvocation, classify};

/// Default ceiling on model calls per turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Default deadline for one model call.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Answered,
    ModelFailed,
    BudgetExhausted,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Answered => "answered",
            Termination::ModelFailed => "model_failed",
            Termination::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// The result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Reply for the customer. Empty when the model failed.
    pub answer: String,
    /// The turn's complete reasoning trace.
    pub trace: Trace,
    /// Model calls made.
    pub iterations: usize,
    /// Tool calls dispatched, including failed ones.
    pub tool_calls_made: usize,
    pub termination: Termination,
}

pub struct IterationController {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    parser: Arc<dyn StepParser>,
    prompts: PromptBuilder,
    max_iterations: usize,
    model_timeout: Duration,
    exhausted_answer: String,
    event_bus: Arc<EventBus>,
}

impl IterationController {
    /// Create a controller. The system instructions are generated from the
    /// registered tools and the parser's response format.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        parser: Arc<dyn StepParser>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let instructions = system_instructions(&tools.definitions(), parser.format_instructions());
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            max_tokens: None,
            tools,
            parser,
            prompts: PromptBuilder::new(instructions),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            exhausted_answer: String::new(),
            event_bus,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Answer returned when the iteration ceiling is reached.
    pub fn with_exhausted_answer(mut self, answer: impl Into<String>) -> Self {
        self.exhausted_answer = answer.into();
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.prompts = self.prompts.with_history_window(window);
        self
    }

    /// Replace the generated system instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let window = self.prompts.history_window();
        self.prompts = PromptBuilder::new(instructions).with_history_window(window);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn parser(&self) -> &dyn StepParser {
        self.parser.as_ref()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn instructions(&self) -> &str {
        self.prompts.instructions()
    }

    /// Run one turn against `session`.
    ///
    /// The session's conversation must already end with the user message.
    /// On return `session.trace` holds this turn's trace; the conversation
    /// is only touched to record which tools were used.
    pub async fn run_turn(&self, session: &mut Session) -> TurnOutcome {
        let mut trace = Trace::new(self.max_iterations);
        let mut tool_calls_made = 0usize;

        info!(
            session = %session.key,
            model = %self.model,
            max_iter = self.max_iterations,
            "Turn starting"
        );

        let (answer, termination) = loop {
            if !trace.tick() {
                warn!(
                    session = %session.key,
                    "Max iterations reached ({})", self.max_iterations
                );
                break (self.exhausted_answer.clone(), Termination::BudgetExhausted);
            }
            let iteration = trace.iterations;
            debug!(session = %session.key, iteration, "Iteration");

            let prompt = self.prompts.build(session, &trace);
            let raw = match self.call_model(prompt).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(session = %session.key, iteration, "Model call failed: {e}");
                    break (String::new(), Termination::ModelFailed);
                }
            };

            let step = match self.parser.parse(&raw) {
                Ok(step) => step,
                Err(failure) => {
                    debug!(session = %session.key, iteration, "{failure}");
                    trace.add_error(&format!("Format error: {}", self.parser.correction()));
                    continue;
                }
            };
            trace.add_think(&step.thought);

            match classify(&step.action) {
                Ok(Action::ToolCall(call)) => {
                    trace.add_action(&step.action);
                    tool_calls_made += 1;
                    self.dispatch(session, &call, &mut trace).await;
                }
                Ok(action) => {
                    let text = action.answer().unwrap_or_default().to_string();
                    trace.add_action("respond");
                    trace.add_result(&text);
                    break (text, Termination::Answered);
                }
                Err(e) => {
                    debug!(session = %session.key, iteration, action = %step.action, "{e}");
                    trace.add_action(&step.action);
                    trace.add_error(&e.to_string());
                }
            }
        };

        info!(
            session = %session.key,
            iterations = trace.iterations,
            tool_calls = tool_calls_made,
            termination = termination.as_str(),
            "Turn completed"
        );

        session.trace = trace.clone();
        TurnOutcome {
            answer,
            iterations: trace.iterations,
            trace,
            tool_calls_made,
            termination,
        }
    }

    async fn call_model(&self, prompt: String) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            system: self.prompts.instructions().to_string(),
            prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = tokio::time::timeout(self.model_timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(self.model_timeout.as_secs()))??;

        if response.content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(response.content)
    }

    async fn dispatch(&self, session: &mut Session, call: &ToolInvocation, trace: &mut Trace) {
        if self.tools.contains(&call.name) {
            session.conversation.record_tool_usage(&call.name);
        }

        let start = Instant::now();
        let result = self.tools.invoke(&call.name, &call.raw_args).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let success = result.is_ok();
        match result {
            Ok(value) => {
                debug!(session = %session.key, tool = %call.name, duration_ms, "Tool succeeded");
                trace.add_result(&value.to_string());
            }
            Err(e) => {
                debug!(session = %session.key, tool = %call.name, "Tool failed: {e}");
                trace.add_error(&e.to_string());
            }
        }

        self.event_bus.publish(DomainEvent::ToolExecuted {
            session_id: session.key.clone(),
            tool_name: call.name.clone(),
            success,
            duration_ms,
            timestamp: Utc::now(),
        });
    }
}
