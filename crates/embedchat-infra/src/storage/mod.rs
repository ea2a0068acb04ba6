//! Conversation store adapters.
//!
//! - `memory`: `DashMap`-backed, process lifetime only.
//! - `file`: one JSON file under the platform data directory.

pub mod file;
pub mod memory;

pub use file::{FileConversationStore, default_store_path};
pub use memory::MemoryConversationStore;
