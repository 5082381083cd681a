//! Order identifiers sent to the provider.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::invoice::InvoiceId;

/// `<invoiceId>_<suffix>` string the provider sees as `orderId`.
///
/// The provider rejects an order id it has already seen, so every link
/// request gets a fresh suffix even for the same invoice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generates a fresh order id for the invoice.
    pub fn generate(invoice_id: InvoiceId) -> Self {
        let micros = Utc::now().timestamp_micros();
        let entropy: u32 = rand::rng().random();
        Self(format!("{}_{:x}{:08x}", invoice_id, micros, entropy))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the invoice id from the first `_`-separated segment.
    ///
    /// Returns `None` when that segment is not an integer.
    pub fn invoice_id(&self) -> Option<InvoiceId> {
        self.0.split('_').next()?.parse().ok()
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_id_from_order_id() {
        assert_eq!(
            OrderId::from("482_abx123").invoice_id(),
            Some(InvoiceId::new(482))
        );
        assert_eq!(OrderId::from("0_x").invoice_id(), Some(InvoiceId::new(0)));
        assert_eq!(OrderId::from("77").invoice_id(), Some(InvoiceId::new(77)));
        assert_eq!(OrderId::from("abc_1").invoice_id(), None);
        assert_eq!(OrderId::from("").invoice_id(), None);
    }

    #[test]
    fn test_generated_order_ids_are_unique() {
        let a = OrderId::generate(InvoiceId::new(9));
        let b = OrderId::generate(InvoiceId::new(9));
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("9_"));
        assert_eq!(a.invoice_id(), Some(InvoiceId::new(9)));
    }
}
