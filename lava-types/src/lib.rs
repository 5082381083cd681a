//! # Lava Types
//!
//! Domain types and port traits for the Lava.ru gateway integration.
//! This crate has no IO dependencies - only data structures, gateway
//! rules, and the trait definitions the adapters implement.
//!
//! ## Architecture
//!
//! - `domain/` - Invoices, money, order and transaction identifiers,
//!   webhook notifications, gateway configuration
//! - `ports/` - The billing system and provider API contracts
//! - `dto/` - Wire shapes for the provider API and our HTTP surface
//! - `error/` - Link, webhook, and repository error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ConfigField, Currency, FieldType, GatewayConfig, GatewayCredentials, GatewayMetadata, Invoice,
    InvoiceId, InvoicePayment, InvoiceStatus, Money, OrderId, PaymentNotification, TransactionId,
    config_fields,
};
pub use dto::*;
pub use error::{DomainError, LinkError, RepoError, WebhookError};
pub use ports::{BillingSystem, InvoiceApi};
