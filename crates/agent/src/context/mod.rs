//! What the model gets to see each iteration.
//!
//! - [`facts`]: customer details pulled from raw user text
//! - [`prompt`]: the per-iteration prompt and the fixed system instructions

pub mod facts;
pub mod prompt;

pub use prompt::{PromptBuilder, system_instructions};
