//! Observability setup for embedchat binaries.

pub mod tracing_setup;
