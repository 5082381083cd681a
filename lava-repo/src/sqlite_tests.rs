//! SQLite billing adapter integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lava_types::{
        BillingSystem, Currency, InvoiceId, InvoicePayment, InvoiceStatus, ModuleCall, Money,
        RepoError, TransactionId,
    };

    use crate::SqliteBilling;

    async fn setup_repo() -> SqliteBilling {
        SqliteBilling::new("sqlite::memory:").await.unwrap()
    }

    fn rub(amount: i64) -> Money {
        Money::new(amount, Currency::RUB).unwrap()
    }

    fn payment(invoice: i64, tx: &str, amount: i64) -> InvoicePayment {
        InvoicePayment {
            invoice_id: InvoiceId::new(invoice),
            transaction_id: TransactionId::new(tx),
            amount,
            fee: 0,
            gateway: "lava".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_invoice() {
        let repo = setup_repo().await;
        repo.create_invoice(InvoiceId::new(482), rub(150_000))
            .await
            .unwrap();

        let invoice = repo.get_invoice(InvoiceId::new(482)).await.unwrap().unwrap();

        assert_eq!(invoice.id, InvoiceId::new(482));
        assert_eq!(invoice.total, rub(150_000));
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert!(invoice.date_paid.is_none());
    }

    #[tokio::test]
    async fn test_create_invoice_twice_conflicts() {
        let repo = setup_repo().await;
        repo.create_invoice(InvoiceId::new(1), rub(100)).await.unwrap();

        let result = repo.create_invoice(InvoiceId::new(1), rub(100)).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_validate_invoice() {
        let repo = setup_repo().await;
        repo.create_invoice(InvoiceId::new(7), rub(100)).await.unwrap();

        assert_eq!(
            repo.validate_invoice(InvoiceId::new(7), "lava").await.unwrap(),
            Some(InvoiceId::new(7))
        );
        assert_eq!(
            repo.validate_invoice(InvoiceId::new(8), "lava").await.unwrap(),
            None
        );
        assert_eq!(
            repo.validate_invoice(InvoiceId::new(0), "lava").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_zero_amount_payment_marks_invoice_paid() {
        let repo = setup_repo().await;
        repo.create_invoice(InvoiceId::new(1), rub(5_000)).await.unwrap();

        repo.add_invoice_payment(payment(1, "uuid-1", 0)).await.unwrap();

        let invoice = repo.get_invoice(InvoiceId::new(1)).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert!(invoice.date_paid.is_some());
        assert!(
            repo.is_transaction_recorded(&TransactionId::new("uuid-1"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_partial_payment_leaves_invoice_unpaid() {
        let repo = setup_repo().await;
        repo.create_invoice(InvoiceId::new(1), rub(5_000)).await.unwrap();

        repo.add_invoice_payment(payment(1, "part-1", 2_000))
            .await
            .unwrap();
        let invoice = repo.get_invoice(InvoiceId::new(1)).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);

        repo.add_invoice_payment(payment(1, "part-2", 0)).await.unwrap();
        let invoice = repo.get_invoice(InvoiceId::new(1)).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_duplicate_transaction_is_rejected_atomically() {
        let repo = setup_repo().await;
        repo.create_invoice(InvoiceId::new(1), rub(5_000)).await.unwrap();

        repo.add_invoice_payment(payment(1, "uuid-1", 0)).await.unwrap();
        let second = repo.add_invoice_payment(payment(1, "uuid-1", 0)).await;

        assert!(matches!(second, Err(RepoError::Conflict(_))));
        assert_eq!(repo.count_payments(InvoiceId::new(1)).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deliveries_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("billing.db").display());
        let repo = Arc::new(SqliteBilling::new(&url).await.unwrap());
        repo.create_invoice(InvoiceId::new(1), rub(5_000)).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.add_invoice_payment(payment(1, "uuid-1", 0)).await })
            })
            .collect();

        let mut applied = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => applied += 1,
                Err(RepoError::Conflict(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(applied, 1);
        assert_eq!(repo.count_payments(InvoiceId::new(1)).await.unwrap(), 1);
        let invoice = repo.get_invoice(InvoiceId::new(1)).await.unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_payment_for_unknown_invoice() {
        let repo = setup_repo().await;

        let result = repo.add_invoice_payment(payment(99, "uuid-1", 0)).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_gateway_log_round_trip() {
        let repo = setup_repo().await;

        repo.log_transaction(
            "lava",
            serde_json::json!({ "error": "Invoice not found", "order_id": "9_x" }),
            "Failure",
        )
        .await
        .unwrap();

        let log = repo.gateway_log().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].gateway, "lava");
        assert_eq!(log[0].result, "Failure");
        assert_eq!(log[0].data["order_id"], "9_x");
    }

    #[tokio::test]
    async fn test_module_call_is_recorded() {
        let repo = setup_repo().await;

        repo.log_module_call(ModuleCall {
            module: "Lava".into(),
            action: "/business/invoice/create".into(),
            request: serde_json::json!({ "orderId": "1_a" }),
            response: r#"{"status":200}"#.into(),
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM module_log")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
