//! # Lava Repository
//!
//! Billing-system adapters for the Lava.ru gateway and the signing
//! primitives shared by the link generator and the webhook receiver.
//! The adapters implement the `BillingSystem` port.

use async_trait::async_trait;
use lava_types::{
    BillingSystem, Invoice, InvoiceId, InvoicePayment, ModuleCall, RepoError, TransactionId,
};

pub mod memory;
pub mod security;
pub mod sqlite;

mod types;

#[cfg(test)]
mod sqlite_tests;

pub use memory::MemoryBilling;
pub use sqlite::SqliteBilling;

/// Billing adapter chosen at startup from the database URL.
pub enum Repo {
    Sqlite(SqliteBilling),
    Memory(MemoryBilling),
}

/// Build and initialize a billing adapter from a database URL.
///
/// `memory` selects the in-process adapter; anything else is handed to
/// SQLite, which creates and migrates the database.
///
/// # Examples
///
/// ```ignore
/// let repo = build_repo("sqlite://data/billing.db?mode=rwc").await?;
/// let repo = build_repo("memory").await?;
/// ```
pub async fn build_repo(database_url: &str) -> anyhow::Result<Repo> {
    if database_url == "memory" {
        tracing::warn!("Using in-memory billing store; data is lost on restart");
        return Ok(Repo::Memory(MemoryBilling::new()));
    }
    Ok(Repo::Sqlite(SqliteBilling::new(database_url).await?))
}

impl Repo {
    /// Inserts an unpaid invoice.
    pub async fn create_invoice(
        &self,
        id: InvoiceId,
        total: lava_types::Money,
    ) -> Result<Invoice, RepoError> {
        match self {
            Repo::Sqlite(r) => r.create_invoice(id, total).await,
            Repo::Memory(r) => r.create_invoice(id, total),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Implement BillingSystem for Repo (delegation)
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl BillingSystem for Repo {
    async fn validate_invoice(
        &self,
        id: InvoiceId,
        gateway: &str,
    ) -> Result<Option<InvoiceId>, RepoError> {
        match self {
            Repo::Sqlite(r) => r.validate_invoice(id, gateway).await,
            Repo::Memory(r) => r.validate_invoice(id, gateway).await,
        }
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepoError> {
        match self {
            Repo::Sqlite(r) => r.get_invoice(id).await,
            Repo::Memory(r) => r.get_invoice(id).await,
        }
    }

    async fn is_transaction_recorded(&self, id: &TransactionId) -> Result<bool, RepoError> {
        match self {
            Repo::Sqlite(r) => r.is_transaction_recorded(id).await,
            Repo::Memory(r) => r.is_transaction_recorded(id).await,
        }
    }

    async fn add_invoice_payment(&self, payment: InvoicePayment) -> Result<(), RepoError> {
        match self {
            Repo::Sqlite(r) => r.add_invoice_payment(payment).await,
            Repo::Memory(r) => r.add_invoice_payment(payment).await,
        }
    }

    async fn log_transaction(
        &self,
        gateway: &str,
        data: serde_json::Value,
        result: &str,
    ) -> Result<(), RepoError> {
        match self {
            Repo::Sqlite(r) => r.log_transaction(gateway, data, result).await,
            Repo::Memory(r) => r.log_transaction(gateway, data, result).await,
        }
    }

    async fn log_module_call(&self, call: ModuleCall) -> Result<(), RepoError> {
        match self {
            Repo::Sqlite(r) => r.log_module_call(call).await,
            Repo::Memory(r) => r.log_module_call(call).await,
        }
    }
}
