//! Session storage implementations for Cardwise.

pub mod in_memory;

pub use in_memory::InMemorySessionStore;
