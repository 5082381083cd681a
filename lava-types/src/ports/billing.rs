//! Billing system port.
//!
//! The host billing system owns invoices, payments, and the audit log.
//! Adapters (SQLite, in-memory) implement this trait.

use crate::domain::{Invoice, InvoiceId, InvoicePayment, TransactionId};
use crate::dto::ModuleCall;
use crate::error::RepoError;

/// The billing system as the gateway sees it.
///
/// Lookups return `Option`/`bool` rather than erroring on "not found" or
/// "already seen". `add_invoice_payment` MUST refuse a transaction id that
/// is already recorded with `RepoError::Conflict`, atomically with the
/// insert; that is the safety net for concurrent webhook redelivery.
#[async_trait::async_trait]
pub trait BillingSystem: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Invoice lookups
    // ─────────────────────────────────────────────────────────────────────────────

    /// Checks that the invoice exists and may be paid through `gateway`.
    async fn validate_invoice(
        &self,
        id: InvoiceId,
        gateway: &str,
    ) -> Result<Option<InvoiceId>, RepoError>;

    /// Gets an invoice by ID.
    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments (MUST be atomic)
    // ─────────────────────────────────────────────────────────────────────────────

    /// True when a payment with this transaction id was already applied.
    async fn is_transaction_recorded(&self, id: &TransactionId) -> Result<bool, RepoError>;

    /// Applies a payment and marks the invoice paid once fully covered.
    async fn add_invoice_payment(&self, payment: InvoicePayment) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Audit
    // ─────────────────────────────────────────────────────────────────────────────

    /// Appends an entry to the gateway transaction log.
    async fn log_transaction(
        &self,
        gateway: &str,
        data: serde_json::Value,
        result: &str,
    ) -> Result<(), RepoError>;

    /// Records an outbound provider API call.
    async fn log_module_call(&self, call: ModuleCall) -> Result<(), RepoError>;
}
