//! Widget session engine for embedchat.
//!
//! This crate defines the "ports" (transport and storage traits) that the
//! infrastructure layer implements, and the client-side state engine built
//! on them: token caching, conversation identity, the conversation
//! controller, and the agent-message poller. It depends only on
//! `embedchat-types` -- never on `embedchat-infra` or any HTTP/IO crate.

pub mod api;
pub mod chat;
pub mod event;
pub mod storage;
pub mod widget;

#[cfg(test)]
pub(crate) mod testing;
