//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the link generator and the webhook
//! processor.

mod handlers;
mod server;

pub use handlers::AppState;
pub use server::HttpServer;
