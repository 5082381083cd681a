//! Domain models for the gateway integration.

pub mod config;
pub mod invoice;
pub mod money;
pub mod notification;
pub mod order;
pub mod transaction;

pub use config::{
    ConfigField, FieldType, GatewayConfig, GatewayCredentials, GatewayMetadata, config_fields,
};
pub use invoice::{Invoice, InvoiceId, InvoicePayment, InvoiceStatus};
pub use money::{Currency, Money};
pub use notification::PaymentNotification;
pub use order::OrderId;
pub use transaction::TransactionId;
