//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod billing;
mod invoice_api;

pub use billing::BillingSystem;
pub use invoice_api::InvoiceApi;
