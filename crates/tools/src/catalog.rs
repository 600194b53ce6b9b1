//! Catalogue tools — browse the card offers.

use async_trait::async_trait;
use cardwise_core::args::ToolArgs;
use cardwise_core::error::ToolError;
use cardwise_core::tool::Tool;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::backend::CardBackend;
use crate::to_value;

/// `getCards()` — the full catalogue.
pub struct GetCardsTool {
    backend: Arc<dyn CardBackend>,
}

impl GetCardsTool {
    pub fn new(backend: Arc<dyn CardBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetCardsTool {
    fn name(&self) -> &str {
        "getCards"
    }

    fn description(&self) -> &str {
        "Get a list of all available credit cards with their details"
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value, ToolError> {
        to_value(self.name(), &self.backend.cards().await)
    }
}

/// `getCard(id)` — one card by id.
pub struct GetCardTool {
    backend: Arc<dyn CardBackend>,
}

impl GetCardTool {
    pub fn new(backend: Arc<dyn CardBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetCardTool {
    fn name(&self) -> &str {
        "getCard"
    }

    fn description(&self) -> &str {
        "Get details for a single credit card by its ID"
    }

    fn params(&self) -> &[&str] {
        &["id"]
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value, ToolError> {
        let id = args.integer(0, "id")?;
        let card = self
            .backend
            .card(id)
            .await
            .map_err(|e| ToolError::failed(self.name(), e.to_string()))?;
        to_value(self.name(), &card)
    }
}

/// `getBonuses()` — card names with their signup bonuses only.
pub struct GetBonusesTool {
    backend: Arc<dyn CardBackend>,
}

impl GetBonusesTool {
    pub fn new(backend: Arc<dyn CardBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetBonusesTool {
    fn name(&self) -> &str {
        "getBonuses"
    }

    fn description(&self) -> &str {
        "Get a simplified list showing only card names and their signup bonuses"
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value, ToolError> {
        let bonuses: Vec<Value> = self
            .backend
            .cards()
            .await
            .into_iter()
            .map(|c| json!({ "cardName": c.card_name, "bonus": c.signup_bonus }))
            .collect();
        Ok(Value::Array(bonuses))
    }
}
