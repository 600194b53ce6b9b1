//! The reasoning loop behind the Cardwise agent.
//!
//! Each user turn follows a **Think → Act → Observe** cycle:
//!
//! 1. **Receive** a user message and extract facts from it
//! 2. **Build a prompt** from facts, recent history and the turn trace
//! 3. **Ask the model** for one step (a thought plus an action)
//! 4. **If a tool call**: run it, record the result or error, go back to 2
//! 5. **If an answer**: return it to the customer
//!
//! The loop stops at the first answer, a model failure, or the iteration
//! ceiling, whichever comes first.

pub mod context;
pub mod controller;
pub mod service;
pub mod step;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{PromptBuilder, system_instructions};
pub use controller::{IterationController, Termination, TurnOutcome};
pub use service::{AGENT_NAME, AgentService};
pub use step::{
    Action, JsonStepParser, LabeledStepParser, ParseFailure, Step, StepParser, ToolInvocation,
    classify, parser_for,
};
