//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what let the agent act on behalf of the customer: list the card
//! catalogue, submit an application, check its status, and so on. The model
//! names a tool and passes raw argument text; the registry resolves the name
//! and hands the parsed [`ToolArgs`] to the tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::args::ToolArgs;
use crate::error::ToolError;

/// Description of a tool as shown to the model and to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Call form, e.g. `getCard(id)`
    pub signature: String,
}

/// The core Tool trait.
///
/// A tool returns a structured JSON value on success. Business failures
/// (application not found, cancellation refused) are reported as
/// [`ToolError::ExecutionFailed`] so the agent can show them to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name the model uses to call this tool (e.g., "getCard").
    fn name(&self) -> &str;

    /// What this tool does (sent to the model).
    fn description(&self) -> &str;

    /// Parameter names in positional order.
    fn params(&self) -> &[&str] {
        &[]
    }

    /// Execute the tool with parsed arguments.
    async fn execute(&self, args: ToolArgs) -> std::result::Result<serde_json::Value, ToolError>;

    /// Call form shown to the model, e.g. `getCard(id)`.
    fn signature(&self) -> String {
        format!("{}({})", self.name(), self.params().join(", "))
    }

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            signature: self.signature(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Render the tool catalogue into the system instructions
/// 2. Look up and invoke tools when the model requests them
///
/// Registration order is kept so the catalogue renders deterministically.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.to_definition())
            .collect()
    }

    /// Resolve `name`, parse `raw_args` and run the tool.
    pub async fn invoke(
        &self,
        name: &str,
        raw_args: &str,
    ) -> std::result::Result<serde_json::Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        let args = ToolArgs::parse(raw_args)?;
        tool.execute(args).await
    }

    /// All registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
