//! Transaction identifiers used to deduplicate payment application.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::invoice::InvoiceId;
use super::order::OrderId;

/// Prefix of locally synthesized transaction ids.
pub const SYNTHETIC_PREFIX: &str = "LAVA_";

/// Identifier recorded with an applied payment.
///
/// Normally the provider's invoice UUID. When a notification carries no
/// UUID the id is derived from the order and invoice, so a redelivered
/// notification maps to the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives a stable id from the order and the resolved invoice.
    pub fn synthesize(order_id: &OrderId, invoice_id: InvoiceId) -> Self {
        let digest = Sha256::digest(format!("{}:{}", order_id, invoice_id).as_bytes());
        let hex = hex::encode(digest);
        Self(format!("{}{}", SYNTHETIC_PREFIX, &hex[..32]))
    }

    /// Provider UUID when present, otherwise the synthesized id.
    pub fn select(provider_id: Option<&str>, order_id: &OrderId, invoice_id: InvoiceId) -> Self {
        match provider_id {
            Some(id) if !id.is_empty() && id != "0" => Self::new(id),
            _ => Self::synthesize(order_id, invoice_id),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with(SYNTHETIC_PREFIX)
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_uuid_wins() {
        let order = OrderId::from("5_abc");
        let tx = TransactionId::select(
            Some("7f1c2d2e-0000-4000-8000-000000000001"),
            &order,
            InvoiceId::new(5),
        );
        assert_eq!(tx.as_str(), "7f1c2d2e-0000-4000-8000-000000000001");
        assert!(!tx.is_synthetic());
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let order = OrderId::from("5_abc");
        let a = TransactionId::select(None, &order, InvoiceId::new(5));
        let b = TransactionId::select(Some(""), &order, InvoiceId::new(5));
        assert_eq!(a, b);
        assert!(a.is_synthetic());
        assert_eq!(a.as_str().len(), SYNTHETIC_PREFIX.len() + 32);
    }

    #[test]
    fn test_fallback_differs_per_order() {
        let a = TransactionId::synthesize(&OrderId::from("5_abc"), InvoiceId::new(5));
        let b = TransactionId::synthesize(&OrderId::from("5_abd"), InvoiceId::new(5));
        assert_ne!(a, b);
    }
}
