//! Session state and the session store abstraction.
//!
//! A session bundles everything the agent knows about one user: the
//! conversation, heuristically extracted facts, and the trace of the last
//! turn. The agent only needs get-or-create, read, write, delete and list
//! semantics; how sessions are kept is up to the [`SessionStore`]
//! implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SessionError;
use crate::message::Conversation;
use crate::trace::Trace;

/// Facts extracted from user text, e.g. `name` and `surname`.
///
/// Ordered so that prompts render facts deterministically.
pub type FactMap = BTreeMap<String, String>;

/// Everything the agent keeps for a single session key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: String,
    pub conversation: Conversation,
    pub facts: FactMap,
    /// Trace of the most recently completed turn.
    pub trace: Trace,
}

impl Session {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            conversation: Conversation::new(key.clone()),
            key,
            facts: FactMap::new(),
            trace: Trace::default(),
        }
    }

    /// Last time anything was appended to the conversation.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.conversation.last_activity
    }
}

/// Backing storage for sessions.
///
/// Reads hand out snapshots and writes replace the stored session whole, so
/// two turns racing on the same key resolve last-writer-wins. Callers that
/// need ordering must serialize requests per session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Load a session, creating and storing an empty one if the key is new.
    async fn load_or_create(&self, key: &str) -> std::result::Result<Session, SessionError>;

    /// Load a session if it exists.
    async fn get(&self, key: &str) -> std::result::Result<Option<Session>, SessionError>;

    /// Store a session, replacing any previous value for its key.
    async fn save(&self, session: Session) -> std::result::Result<(), SessionError>;

    /// Remove a session. Returns `true` if it existed.
    async fn remove(&self, key: &str) -> std::result::Result<bool, SessionError>;

    /// Keys of all live sessions.
    async fn keys(&self) -> std::result::Result<Vec<String>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn new_session_is_empty() {
        let session = Session::new("abc");
        assert_eq!(session.key, "abc");
        assert_eq!(session.conversation.session_id, "abc");
        assert!(session.conversation.is_empty());
        assert!(session.facts.is_empty());
        assert!(session.trace.is_empty());
    }

    #[test]
    fn last_activity_follows_conversation() {
        let mut session = Session::new("abc");
        let before = session.last_activity();
        session.conversation.push(Message::user("hi"));
        assert!(session.last_activity() >= before);
    }
}
