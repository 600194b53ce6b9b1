//! Prompt construction.
//!
//! Every iteration sends the model the same fixed instructions plus a prompt
//! rebuilt from session state and the trace so far. Section order is fixed:
//!
//! 1. the current user message, quoted
//! 2. known facts (omitted when there are none)
//! 3. up to `history_window` earlier messages (omitted for a first message)
//! 4. the in-progress turn trace
//! 5. the closing question
//!
//! Facts come before history so that reusable customer data stands out.

use cardwise_core::session::Session;
use cardwise_core::tool::ToolDefinition;
use cardwise_core::trace::Trace;

/// Closing line of every prompt.
pub const CLOSING_QUESTION: &str =
    "What should you do next? Think about the customer's needs and respond appropriately.";

/// Default number of earlier messages shown to the model.
pub const DEFAULT_HISTORY_WINDOW: usize = 4;

/// Builds the per-iteration prompt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    instructions: String,
    history_window: usize,
}

impl PromptBuilder {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Fixed instructions sent as the system message.
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Render the prompt for the next model call.
    pub fn build(&self, session: &Session, trace: &Trace) -> String {
        let conversation = &session.conversation;
        let mut prompt = String::new();

        let last_user = conversation
            .last_user_message()
            .map(|m| m.text.as_str())
            .unwrap_or_default();
        prompt.push_str(&format!("User's last message: \"{last_user}\"\n"));

        if !session.facts.is_empty() {
            prompt.push_str("Known Facts (from this conversation):\n");
            for (key, value) in &session.facts {
                prompt.push_str(&format!("- {key}: {value}\n"));
            }
            prompt.push('\n');
        }

        if conversation.len() >= 2 && self.history_window > 0 {
            let prior = &conversation.messages[..conversation.len() - 1];
            let from = prior.len().saturating_sub(self.history_window);
            prompt.push_str("Recent conversation context:\n");
            for message in &prior[from..] {
                prompt.push_str(&format!("{}: {}\n", message.role, message.text));
            }
            prompt.push('\n');
        }

        prompt.push_str("Current conversation:\n");
        prompt.push_str(&trace.render());
        prompt.push_str(CLOSING_QUESTION);
        prompt.push_str("\n\n");
        prompt
    }
}

/// The agent persona with the tool catalogue and response format filled in.
pub fn system_instructions(tools: &[ToolDefinition], response_format: &str) -> String {
    let mut out = String::from(
        "You are Emma, an autonomous customer service agent for KK Credit Cards.\n\
         \n\
         ## How you work\n\
         - Decide step by step how to help the customer, using the tools below.\n\
         - Remember everything said in this conversation. Never ask for the same information twice.\n\
         - If a tool returns an error, or information is missing, recover naturally: retry, ask, or explain.\n\
         - Always respond in English, regardless of the customer's language.\n\
         \n\
         ## Rules\n\
         - When a customer gives their name (e.g. \"I'm Jane Smith\"), your first action is \
         getCustomerApplications with that name.\n\
         - Prefer using a tool over a generic reply whenever a tool can help.\n\
         - Before asking for salary, birthday or other details, check the Known Facts and earlier \
         Result lines and reuse what is already there.\n\
         - Before submitApplication, use getCards to find the right cardId.\n\
         \n\
         ## Tools\n",
    );

    for tool in tools {
        out.push_str(&format!("- {}: {}\n", tool.signature, tool.description));
    }

    out.push_str("\nArguments may be positional (getCard(3)) or a JSON object ");
    out.push_str("(submitApplication({\"name\": \"Jane\", ...})). Dates use YYYY-MM-DD.\n");
    out.push_str("\n## Response format\n");
    out.push_str(response_format);
    out.push('\n');
    out
}
