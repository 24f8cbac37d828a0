//! Session store: the durable, concurrent repository of conversation state
//! the turn engine reads as context and writes as it appends tool calls,
//! tool results, and messages.

pub mod store;

pub use store::{CreateOptions, InMemorySessionStore, SessionStore};
