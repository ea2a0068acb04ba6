//! Shared domain types for embedchat.
//!
//! This crate contains the types used across the widget engine: the widget
//! session, transcript entries, the public embed API wire format, widget
//! configuration, events, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod session;
pub mod transcript;
pub mod wire;
