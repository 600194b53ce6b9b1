//! # Cardwise Core
//!
//! Domain types, traits, and error definitions for the Cardwise customer
//! service agent. This crate has **no framework dependencies**; it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The agent's outer edges (model provider, session storage, tools) are
//! traits here. Implementations live in their respective crates, so tests can
//! substitute scripted providers and in-memory stores.

pub mod args;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod session;
pub mod tool;
pub mod trace;

// Re-export key types at crate root for ergonomics
pub use args::ToolArgs;
pub use error::{Error, ProviderError, Result, SessionError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use session::{FactMap, Session, SessionStore};
pub use tool::{Tool, ToolDefinition, ToolRegistry};
pub use trace::{Trace, TraceEntry, TraceKind};
