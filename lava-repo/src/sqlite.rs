//! SQLite billing-system adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use lava_types::{
    BillingSystem, GatewayLogEntry, Invoice, InvoiceId, InvoicePayment, InvoiceStatus, Money,
    ModuleCall, RepoError, TransactionId,
};

use crate::types::{DbGatewayLog, DbInvoice};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Billing
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite billing-system implementation.
pub struct SqliteBilling {
    pool: SqlitePool,
}

fn db_err(e: sqlx::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

impl SqliteBilling {
    /// Creates a new SQLite billing store with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Each in-memory connection is its own database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::raw_sql(ddl)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Inserts an unpaid invoice; used for seeding and tests.
    pub async fn create_invoice(&self, id: InvoiceId, total: Money) -> Result<Invoice, RepoError> {
        let result = sqlx::query(
            r#"INSERT INTO invoices (id, total, currency, status) VALUES (?, ?, ?, 'Unpaid')"#,
        )
        .bind(id.get())
        .bind(total.amount())
        .bind(total.currency().to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Invoice::new(id, total)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(RepoError::Conflict(format!("Invoice {} already exists", id)))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    /// Returns the gateway log, oldest first.
    pub async fn gateway_log(&self) -> Result<Vec<GatewayLogEntry>, RepoError> {
        let rows: Vec<DbGatewayLog> = sqlx::query_as(
            r#"SELECT gateway, data, result, created_at FROM gateway_log ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Number of payments recorded against an invoice.
    pub async fn count_payments(&self, id: InvoiceId) -> Result<i64, RepoError> {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM invoice_payments WHERE invoice_id = ?"#)
            .bind(id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Port implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl BillingSystem for SqliteBilling {
    async fn validate_invoice(
        &self,
        id: InvoiceId,
        gateway: &str,
    ) -> Result<Option<InvoiceId>, RepoError> {
        if id.get() <= 0 {
            return Ok(None);
        }

        let found: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM invoices WHERE id = ?"#)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        tracing::debug!(invoice_id = %id, gateway, found = found.is_some(), "Invoice validated");
        Ok(found.map(InvoiceId::new))
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepoError> {
        let row: Option<DbInvoice> = sqlx::query_as(
            r#"SELECT id, total, currency, status, date_paid FROM invoices WHERE id = ?"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn is_transaction_recorded(&self, id: &TransactionId) -> Result<bool, RepoError> {
        let found: Option<i64> =
            sqlx::query_scalar(r#"SELECT id FROM invoice_payments WHERE transaction_id = ?"#)
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(found.is_some())
    }

    async fn add_invoice_payment(&self, payment: InvoicePayment) -> Result<(), RepoError> {
        // Take the write lock up front; concurrent writers then wait on
        // busy_timeout instead of failing the read-to-write upgrade.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(db_err)?;

        let invoice: DbInvoice = sqlx::query_as(
            r#"SELECT id, total, currency, status, date_paid FROM invoices WHERE id = ?"#,
        )
        .bind(payment.invoice_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(RepoError::NotFound)?;

        let paid: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(SUM(amount), 0) FROM invoice_payments WHERE invoice_id = ?"#,
        )
        .bind(payment.invoice_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        // Zero means "whatever is still due".
        let applied = if payment.amount == 0 {
            (invoice.total - paid).max(0)
        } else {
            payment.amount
        };

        let now = chrono::Utc::now().to_rfc3339();
        let inserted = sqlx::query(
            r#"INSERT INTO invoice_payments (invoice_id, transaction_id, amount, fee, gateway, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(payment.invoice_id.get())
        .bind(payment.transaction_id.as_str())
        .bind(applied)
        .bind(payment.fee)
        .bind(&payment.gateway)
        .bind(&now)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(RepoError::Conflict(format!(
                    "Transaction {} already recorded",
                    payment.transaction_id
                )));
            }
            Err(e) => return Err(db_err(e)),
        }

        if paid + applied >= invoice.total && invoice.status != InvoiceStatus::Paid.as_ref() {
            sqlx::query(r#"UPDATE invoices SET status = ?, date_paid = ? WHERE id = ?"#)
                .bind(InvoiceStatus::Paid.as_ref())
                .bind(&now)
                .bind(payment.invoice_id.get())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn log_transaction(
        &self,
        gateway: &str,
        data: serde_json::Value,
        result: &str,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO gateway_log (gateway, data, result, created_at) VALUES (?, ?, ?, ?)"#,
        )
        .bind(gateway)
        .bind(data.to_string())
        .bind(result)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn log_module_call(&self, call: ModuleCall) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO module_log (module, action, request, response, created_at) VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&call.module)
        .bind(&call.action)
        .bind(call.request.to_string())
        .bind(&call.response)
        .bind(call.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
