//! Invoice domain model.
//!
//! Invoices belong to the host billing system. The gateway only reads
//! them (to resolve webhooks and check the paid status) and asks the
//! billing system to apply payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::Money;
use crate::error::DomainError;

/// Integer identifier of an invoice in the billing system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct InvoiceId(i64);

impl InvoiceId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw integer value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for InvoiceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for InvoiceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Payment status of an invoice as the billing system reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
    Cancelled,
    Refunded,
}

impl AsRef<str> for InvoiceStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Unpaid => "Unpaid",
            Self::Paid => "Paid",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(Self::Unpaid),
            "Paid" => Ok(Self::Paid),
            "Cancelled" => Ok(Self::Cancelled),
            "Refunded" => Ok(Self::Refunded),
            other => Err(DomainError::ValidationError(format!(
                "Unknown invoice status: {}",
                other
            ))),
        }
    }
}

/// An invoice owned by the billing system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Total due, in the invoice's currency
    pub total: Money,
    pub status: InvoiceStatus,
    /// When the invoice was marked paid
    pub date_paid: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn new(id: InvoiceId, total: Money) -> Self {
        Self {
            id,
            total,
            status: InvoiceStatus::Unpaid,
            date_paid: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// A payment the gateway asks the billing system to apply.
///
/// An `amount` of zero means "use the invoice's own balance"; the webhook
/// amount is never trusted for crediting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePayment {
    pub invoice_id: InvoiceId,
    pub transaction_id: super::TransactionId,
    pub amount: i64,
    pub fee: i64,
    pub gateway: String,
}
