//! Conversation state and orchestration.
//!
//! - `state`: transcript, update cursor, seen agent ids.
//! - `display`: answer text cleanup before display.
//! - `controller`: the `idle`/`sending` state machine driving submissions.
//! - `poller`: the recurring agent-message poll task.

pub mod controller;
pub mod display;
pub mod poller;
pub mod state;

pub use controller::{AskSettings, ConversationController, Rejection, SubmitOutcome};
pub use poller::UpdatePoller;
