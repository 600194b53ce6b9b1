//! The session control surface.
//!
//! [`AgentService`] owns the session store and the iteration controller and
//! is what transports (HTTP, CLI) talk to. A turn is:
//!
//! 1. load or create the session
//! 2. append the user message and extract facts from it
//! 3. run the controller
//! 4. append the answer and save the session
//!
//! Concurrent turns on the same session key are last-writer-wins.

use cardwise_config::AppConfig;
use cardwise_core::error::{Error, Result};
use cardwise_core::event::{DomainEvent, EventBus, preview};
use cardwise_core::message::{Conversation, Message};
use cardwise_core::provider::Provider;
use cardwise_core::session::{FactMap, SessionStore};
use cardwise_core::tool::ToolRegistry;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::context::facts;
use crate::controller::{IterationController, TurnOutcome};
use crate::step::parser_for;

/// Name the agent introduces itself with.
pub const AGENT_NAME: &str = "Emma";

pub struct AgentService {
    controller: IterationController,
    store: Arc<dyn SessionStore>,
    event_bus: Arc<EventBus>,
}

impl AgentService {
    pub fn new(
        controller: IterationController,
        store: Arc<dyn SessionStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            controller,
            store,
            event_bus,
        }
    }

    /// Wire a service from configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn SessionStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let agent = &config.agent;
        let mut controller = IterationController::new(
            provider,
            config.provider.model.clone(),
            tools,
            parser_for(agent.step_format),
            event_bus.clone(),
        )
        .with_temperature(config.provider.temperature)
        .with_max_tokens(config.provider.max_tokens)
        .with_max_iterations(agent.max_iterations)
        .with_model_timeout(Duration::from_secs(config.provider.timeout_secs))
        .with_history_window(agent.history_window);

        if let Some(answer) = &agent.exhausted_answer {
            controller = controller.with_exhausted_answer(answer.clone());
        }
        if let Some(instructions) = &agent.system_prompt_override {
            controller = controller.with_instructions(instructions.clone());
        }

        Self::new(controller, store, event_bus)
    }

    pub fn controller(&self) -> &IterationController {
        &self.controller
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Process one user message and return the turn's outcome.
    ///
    /// Model failures and an exhausted iteration budget still count as a
    /// completed turn; the answer is then empty (or the configured
    /// exhaustion answer). Only blank input and storage failures are errors.
    pub async fn process_turn(&self, session_key: &str, user_text: &str) -> Result<TurnOutcome> {
        if session_key.trim().is_empty() {
            return Err(Error::InvalidInput("session id must not be empty".into()));
        }
        if user_text.trim().is_empty() {
            return Err(Error::InvalidInput("message must not be empty".into()));
        }

        let started = Instant::now();
        let mut session = self.store.load_or_create(session_key).await?;

        session.conversation.push(Message::user(user_text));
        if facts::extract(&mut session.facts, user_text) {
            debug!(session = %session_key, facts = ?session.facts, "Facts updated");
        }

        self.event_bus.publish(DomainEvent::TurnStarted {
            session_id: session_key.to_string(),
            message_preview: preview(user_text, 80),
            timestamp: Utc::now(),
        });

        let outcome = self.controller.run_turn(&mut session).await;

        session
            .conversation
            .push(Message::assistant(outcome.answer.clone()));
        self.store.save(session).await?;

        let duration_ms = started.elapsed().as_millis() as u64;
        self.event_bus.publish(DomainEvent::TurnCompleted {
            session_id: session_key.to_string(),
            iterations: outcome.iterations,
            tool_calls: outcome.tool_calls_made,
            termination: outcome.termination.as_str().to_string(),
            duration_ms,
            timestamp: Utc::now(),
        });

        info!(
            session = %session_key,
            iterations = outcome.iterations,
            tool_calls = outcome.tool_calls_made,
            duration_ms,
            "Turn processed"
        );

        Ok(outcome)
    }

    /// Run fact extraction on `text` for a session, creating it if needed.
    pub async fn extract_facts(&self, session_key: &str, text: &str) -> Result<bool> {
        let mut session = self.store.load_or_create(session_key).await?;
        let changed = facts::extract(&mut session.facts, text);
        if changed {
            self.store.save(session).await?;
        }
        Ok(changed)
    }

    /// Known facts for a session. Empty for unknown sessions.
    pub async fn facts(&self, session_key: &str) -> Result<FactMap> {
        Ok(self
            .store
            .get(session_key)
            .await?
            .map(|s| s.facts)
            .unwrap_or_default())
    }

    pub async fn get_conversation(&self, session_key: &str) -> Result<Option<Conversation>> {
        Ok(self.store.get(session_key).await?.map(|s| s.conversation))
    }

    /// Drop a session and everything in it. Returns whether it existed.
    pub async fn clear_session(&self, session_key: &str) -> Result<bool> {
        let removed = self.store.remove(session_key).await?;
        if removed {
            info!(session = %session_key, "Session cleared");
            self.event_bus.publish(DomainEvent::SessionCleared {
                session_id: session_key.to_string(),
                timestamp: Utc::now(),
            });
        }
        Ok(removed)
    }

    pub async fn list_active_sessions(&self) -> Result<BTreeSet<String>> {
        Ok(self.store.keys().await?.into_iter().collect())
    }

    /// The last turn's trace, rendered. Empty if there is none.
    pub async fn get_trace(&self, session_key: &str) -> Result<String> {
        Ok(self
            .store
            .get(session_key)
            .await?
            .map(|s| s.trace.render())
            .unwrap_or_default())
    }
}
