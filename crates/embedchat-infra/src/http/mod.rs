//! HTTP adapter for the public embed API.

pub mod transport;

pub use transport::HttpWidgetTransport;
