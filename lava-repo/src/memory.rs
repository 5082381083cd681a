//! In-memory billing-system adapter for development and tests.

use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use lava_types::{
    BillingSystem, GatewayLogEntry, Invoice, InvoiceId, InvoicePayment, InvoiceStatus, Money,
    ModuleCall, RepoError, TransactionId,
};

/// A payment as stored by the in-memory adapter.
#[derive(Debug, Clone)]
pub struct StoredPayment {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub fee: i64,
    pub gateway: String,
}

/// Billing system held entirely in process memory.
#[derive(Default)]
pub struct MemoryBilling {
    invoices: DashMap<InvoiceId, Invoice>,
    payments: DashMap<TransactionId, StoredPayment>,
    gateway_log: Mutex<Vec<GatewayLogEntry>>,
    module_log: Mutex<Vec<ModuleCall>>,
}

impl MemoryBilling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an unpaid invoice.
    pub fn create_invoice(&self, id: InvoiceId, total: Money) -> Result<Invoice, RepoError> {
        match self.invoices.entry(id) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "Invoice {} already exists",
                id
            ))),
            Entry::Vacant(slot) => Ok(slot.insert(Invoice::new(id, total)).clone()),
        }
    }

    pub fn gateway_log(&self) -> Vec<GatewayLogEntry> {
        self.gateway_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn module_log(&self) -> Vec<ModuleCall> {
        self.module_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Payments recorded against an invoice.
    pub fn payments_for(&self, id: InvoiceId) -> Vec<StoredPayment> {
        self.payments
            .iter()
            .filter(|p| p.invoice_id == id)
            .map(|p| p.value().clone())
            .collect()
    }

    fn paid_total(&self, id: InvoiceId, zero: Money) -> Result<Money, RepoError> {
        self.payments
            .iter()
            .filter(|p| p.invoice_id == id)
            .try_fold(zero, |acc, p| acc.checked_add(p.amount))
            .map_err(RepoError::Domain)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepoError {
    RepoError::Database("log mutex poisoned".into())
}

#[async_trait]
impl BillingSystem for MemoryBilling {
    async fn validate_invoice(
        &self,
        id: InvoiceId,
        _gateway: &str,
    ) -> Result<Option<InvoiceId>, RepoError> {
        Ok(self.invoices.contains_key(&id).then_some(id))
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepoError> {
        Ok(self.invoices.get(&id).map(|i| i.clone()))
    }

    async fn is_transaction_recorded(&self, id: &TransactionId) -> Result<bool, RepoError> {
        Ok(self.payments.contains_key(id))
    }

    async fn add_invoice_payment(&self, payment: InvoicePayment) -> Result<(), RepoError> {
        let total = self
            .invoices
            .get(&payment.invoice_id)
            .map(|i| i.total)
            .ok_or(RepoError::NotFound)?;
        let paid = self.paid_total(payment.invoice_id, Money::zero(total.currency()))?;

        let applied = if payment.amount == 0 {
            Money::new((total.amount() - paid.amount()).max(0), total.currency())?
        } else {
            Money::new(payment.amount, total.currency())?
        };

        // The entry guard makes check-and-insert atomic per transaction id.
        match self.payments.entry(payment.transaction_id.clone()) {
            Entry::Occupied(_) => {
                return Err(RepoError::Conflict(format!(
                    "Transaction {} already recorded",
                    payment.transaction_id
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(StoredPayment {
                    invoice_id: payment.invoice_id,
                    amount: applied,
                    fee: payment.fee,
                    gateway: payment.gateway,
                });
            }
        }

        if paid.checked_add(applied)?.covers(&total) {
            if let Some(mut invoice) = self.invoices.get_mut(&payment.invoice_id) {
                if invoice.status != InvoiceStatus::Paid {
                    invoice.status = InvoiceStatus::Paid;
                    invoice.date_paid = Some(chrono::Utc::now());
                }
            }
        }
        Ok(())
    }

    async fn log_transaction(
        &self,
        gateway: &str,
        data: serde_json::Value,
        result: &str,
    ) -> Result<(), RepoError> {
        self.gateway_log
            .lock()
            .map_err(poisoned)?
            .push(GatewayLogEntry {
                gateway: gateway.to_string(),
                data,
                result: result.to_string(),
                created_at: chrono::Utc::now(),
            });
        Ok(())
    }

    async fn log_module_call(&self, call: ModuleCall) -> Result<(), RepoError> {
        self.module_log.lock().map_err(poisoned)?.push(call);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lava_types::Currency;

    fn rub(amount: i64) -> Money {
        Money::new(amount, Currency::RUB).unwrap()
    }

    fn payment(invoice: i64, tx: &str) -> InvoicePayment {
        InvoicePayment {
            invoice_id: InvoiceId::new(invoice),
            transaction_id: TransactionId::new(tx),
            amount: 0,
            fee: 0,
            gateway: "lava".into(),
        }
    }

    #[tokio::test]
    async fn test_zero_amount_pays_invoice_in_full() {
        let repo = MemoryBilling::new();
        repo.create_invoice(InvoiceId::new(1), rub(5000)).unwrap();

        repo.add_invoice_payment(payment(1, "tx-1")).await.unwrap();

        let invoice = repo.get_invoice(InvoiceId::new(1)).await.unwrap().unwrap();
        assert!(invoice.is_paid());
        assert!(invoice.date_paid.is_some());
        assert_eq!(repo.payments_for(InvoiceId::new(1))[0].amount, rub(5000));
    }

    #[tokio::test]
    async fn test_duplicate_transaction_conflicts() {
        let repo = MemoryBilling::new();
        repo.create_invoice(InvoiceId::new(1), rub(5000)).unwrap();

        repo.add_invoice_payment(payment(1, "tx-1")).await.unwrap();
        let second = repo.add_invoice_payment(payment(1, "tx-1")).await;

        assert!(matches!(second, Err(RepoError::Conflict(_))));
        assert_eq!(repo.payments_for(InvoiceId::new(1)).len(), 1);
        assert!(
            repo.is_transaction_recorded(&TransactionId::new("tx-1"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_unknown_invoice() {
        let repo = MemoryBilling::new();
        assert!(
            repo.validate_invoice(InvoiceId::new(0), "lava")
                .await
                .unwrap()
                .is_none()
        );
        assert!(matches!(
            repo.add_invoice_payment(payment(9, "tx")).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_log_entries_are_kept_in_order() {
        let repo = MemoryBilling::new();
        repo.log_transaction("lava", serde_json::json!({"n": 1}), "Webhook Received")
            .await
            .unwrap();
        repo.log_transaction("lava", serde_json::json!({"n": 2}), "Success")
            .await
            .unwrap();

        let results: Vec<_> = repo.gateway_log().into_iter().map(|e| e.result).collect();
        assert_eq!(results, ["Webhook Received", "Success"]);
    }
}
