//! Durable conversation storage.
//!
//! Defines the `ConversationStore` port and the `ConversationIdentity`
//! wrapper that scopes it to one (bot, origin) pair. Store implementations
//! live in embedchat-infra.

pub mod conversation_store;
pub mod identity;

pub use conversation_store::ConversationStore;
pub use identity::ConversationIdentity;
