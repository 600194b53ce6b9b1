//! Message and Conversation domain types.
//!
//! A conversation is the model-visible history of a session: one user
//! message and one assistant message per turn. Internal reasoning steps
//! never land here; they live in the session's [`Trace`](crate::trace::Trace).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The agent
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub text: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// An ordered sequence of messages plus per-session bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// The session this conversation belongs to
    pub session_id: String,

    /// Ordered messages (append order is chronological order)
    pub messages: Vec<Message>,

    /// Names of tools invoked at least once during the session
    pub tools_used: BTreeSet<String>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub last_activity: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation for a session.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            tools_used: BTreeSet::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.last_activity = Utc::now();
        self.messages.push(message);
    }

    /// Record that a tool was invoked. Repeated calls are no-ops.
    pub fn record_tool_usage(&mut self, tool_name: &str) {
        if !self.tools_used.contains(tool_name) {
            self.tools_used.insert(tool_name.to_string());
        }
    }

    /// The last `count` messages, oldest first.
    pub fn recent(&self, count: usize) -> &[Message] {
        let from = self.messages.len().saturating_sub(count);
        &self.messages[from..]
    }

    /// The most recent user message, if any.
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
