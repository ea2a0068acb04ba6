//! Public embed API access.
//!
//! `WidgetTransport` is the port implemented by the HTTP adapter in
//! embedchat-infra. `ApiClient` layers the token cache and the
//! invalidate-on-401 discipline on top of it.

pub mod client;
pub mod token;
pub mod transport;

pub use client::ApiClient;
pub use token::{TokenCache, WidgetToken};
pub use transport::WidgetTransport;
