//! Infrastructure layer for embedchat.
//!
//! Contains implementations of the ports defined in `embedchat-core`: the
//! reqwest-based HTTP transport for the public embed API, in-memory and
//! JSON-file conversation stores, and the TOML widget config loader.

pub mod config;
pub mod http;
pub mod storage;
