//! # Lava Hex
//!
//! Application services and HTTP adapter for the Lava.ru gateway.
//!
//! ## Architecture
//!
//! - `service/` - Link generator and webhook processor
//! - `inbound/` - HTTP adapter (Axum server)
//! - `render` - HTML fragments for the invoice page
//!
//! Services are generic over `B: BillingSystem` and `A: InvoiceApi`, so
//! the billing store and the provider client can be swapped in tests.

pub mod inbound;
pub mod openapi;
pub mod render;
pub mod service;


pub use service::{LinkGenerator, WebhookOutcome, WebhookProcessor};
