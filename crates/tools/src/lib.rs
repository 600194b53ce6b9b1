//! Card desk tools for Cardwise.
//!
//! Nine tools give the agent access to the card catalogue and to customer
//! applications. All of them delegate to a shared [`CardBackend`].

pub mod applications;
pub mod backend;
pub mod catalog;

pub use backend::{
    Application, ApplicationStatus, ApprovalEstimate, BackendError, Card, CardBackend,
    InMemoryBackend, NewApplication, default_catalog,
};

use cardwise_core::error::ToolError;
use cardwise_core::tool::ToolRegistry;
use std::sync::Arc;

/// Serialize a tool result, reporting failures against the tool.
pub(crate) fn to_value<T: serde::Serialize>(
    tool_name: &str,
    value: &T,
) -> Result<serde_json::Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::failed(tool_name, e.to_string()))
}

/// Create the registry of card desk tools over `backend`.
pub fn registry(backend: Arc<dyn CardBackend>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(catalog::GetCardsTool::new(backend.clone())));
    registry.register(Box::new(catalog::GetCardTool::new(backend.clone())));
    registry.register(Box::new(catalog::GetBonusesTool::new(backend.clone())));
    registry.register(Box::new(applications::SubmitApplicationTool::new(backend.clone())));
    registry.register(Box::new(applications::CustomerApplicationsTool::new(backend.clone())));
    registry.register(Box::new(applications::ApplicationStatusTool::new(backend.clone())));
    registry.register(Box::new(applications::CancelApplicationTool::new(backend.clone())));
    registry.register(Box::new(applications::EstimateApprovalTimeTool::new(backend.clone())));
    registry.register(Box::new(applications::ApplicationsNeedingAttentionTool::new(backend)));
    registry
}

/// The registry over a fresh in-memory backend with the default catalogue.
pub fn default_registry() -> ToolRegistry {
    registry(Arc::new(InMemoryBackend::default()))
}
