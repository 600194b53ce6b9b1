//! In-memory session store — sessions live for the process lifetime.
//!
//! With a TTL configured, a session untouched for longer than the TTL is
//! dropped the next time it (or the key list) is accessed.

use async_trait::async_trait;
use cardwise_core::error::SessionError;
use cardwise_core::session::{Session, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct Slot {
    session: Session,
    touched: Instant,
}

/// A store that keeps sessions in a map behind a read-write lock.
#[derive(Clone)]
pub struct InMemorySessionStore {
    slots: Arc<RwLock<HashMap<String, Slot>>>,
    ttl: Option<Duration>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            ttl: None,
        }
    }

    /// Evict sessions idle for longer than `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::new()
        }
    }

    fn expired(&self, slot: &Slot, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(slot.touched) > ttl)
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| !self.expired(slot, now));
        let removed = before - slots.len();
        if removed > 0 {
            debug!(removed, "Evicted idle sessions");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load_or_create(&self, key: &str) -> Result<Session, SessionError> {
        let now = Instant::now();
        let mut slots = self.slots.write().await;

        if let Some(slot) = slots.get_mut(key) {
            if !self.expired(slot, now) {
                slot.touched = now;
                return Ok(slot.session.clone());
            }
            debug!(session = %key, "Session expired, starting fresh");
        }

        let session = Session::new(key);
        slots.insert(
            key.to_string(),
            Slot {
                session: session.clone(),
                touched: now,
            },
        );
        Ok(session)
    }

    async fn get(&self, key: &str) -> Result<Option<Session>, SessionError> {
        let now = Instant::now();
        let slots = self.slots.read().await;
        Ok(slots
            .get(key)
            .filter(|slot| !self.expired(slot, now))
            .map(|slot| slot.session.clone()))
    }

    async fn save(&self, session: Session) -> Result<(), SessionError> {
        let mut slots = self.slots.write().await;
        slots.insert(
            session.key.clone(),
            Slot {
                session,
                touched: Instant::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, SessionError> {
        Ok(self.slots.write().await.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, SessionError> {
        self.purge_expired().await;
        let mut keys: Vec<String> = self.slots.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardwise_core::message::Message;

    #[tokio::test]
    async fn load_or_create_registers_key() {
        let store = InMemorySessionStore::new();
        assert!(store.get("a").await.unwrap().is_none());

        let session = store.load_or_create("a").await.unwrap();
        assert!(session.conversation.is_empty());
        assert!(store.get("a").await.unwrap().is_some());
        assert_eq!(store.keys().await.unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn save_replaces_whole_session() {
        let store = InMemorySessionStore::new();
        let mut session = store.load_or_create("a").await.unwrap();
        session.conversation.push(Message::user("hi"));
        session.facts.insert("name".into(), "Jane".into());
        store.save(session).await.unwrap();

        let loaded = store.get("a").await.unwrap().unwrap();
        assert_eq!(loaded.conversation.len(), 1);
        assert_eq!(loaded.facts.get("name").map(String::as_str), Some("Jane"));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemorySessionStore::new();
        let mut a = store.load_or_create("a").await.unwrap();
        a.conversation.push(Message::user("for a"));
        store.save(a).await.unwrap();

        let b = store.load_or_create("b").await.unwrap();
        assert!(b.conversation.is_empty());
        assert_eq!(store.keys().await.unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn remove_reports_existence() {
        let store = InMemorySessionStore::new();
        store.load_or_create("a").await.unwrap();
        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_expire() {
        let store = InMemorySessionStore::with_ttl(Duration::from_secs(60));
        let mut session = store.load_or_create("a").await.unwrap();
        session.conversation.push(Message::user("hi"));
        store.save(session).await.unwrap();
        store.load_or_create("b").await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        // touching "b" keeps it alive
        store.load_or_create("b").await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.keys().await.unwrap(), vec!["b".to_string()]);

        let fresh = store.load_or_create("a").await.unwrap();
        assert!(fresh.conversation.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn no_ttl_never_expires() {
        let store = InMemorySessionStore::new();
        store.load_or_create("a").await.unwrap();
        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert_eq!(store.purge_expired().await, 0);
        assert!(store.get("a").await.unwrap().is_some());
    }
}
