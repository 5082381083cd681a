//! Webhook processing.
//!
//! One inbound call walks a fixed sequence of gates. Each terminal branch
//! writes exactly one entry to the billing system's gateway log before
//! returning; the "Webhook Received" audit entry is written for every
//! POST that reaches parsing.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use lava_repo::security;
use lava_types::{
    BillingSystem, GatewayConfig, InboundWebhook, InvoiceId, InvoicePayment, PaymentNotification,
    RepoError, TransactionId, WebhookAck, WebhookError,
};

/// How a webhook call ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Not a POST; answered with a bare `OK` and not processed.
    Ignored,
    /// Processed; answered with a JSON acknowledgement.
    Acknowledged(WebhookAck),
}

const FAILURE: &str = "Failure";

/// Validates provider notifications and applies payments exactly once.
pub struct WebhookProcessor<B: BillingSystem> {
    config: Arc<GatewayConfig>,
    billing: Arc<B>,
}

impl<B: BillingSystem> WebhookProcessor<B> {
    pub fn new(config: Arc<GatewayConfig>, billing: Arc<B>) -> Self {
        Self { config, billing }
    }

    /// Runs one webhook call through every gate.
    #[tracing::instrument(skip_all, fields(method = %req.method))]
    pub async fn handle(&self, req: &InboundWebhook) -> Result<WebhookOutcome, WebhookError> {
        if !req.is_post() {
            tracing::debug!("Non-POST request on webhook endpoint, ignoring");
            return Ok(WebhookOutcome::Ignored);
        }

        if !self.config.enabled {
            tracing::warn!("Webhook received while the gateway is disabled");
            self.log(json!({ "error": "Module Not Activated" }), FAILURE)
                .await;
            return Err(WebhookError::NotActivated);
        }

        // Invalid UTF-8 fails here like any other undecodable body.
        let parsed: Option<Value> = serde_json::from_slice(&req.body).ok();
        self.log(
            json!({
                "raw_input": String::from_utf8_lossy(&req.body),
                "parsed_data": parsed,
                "headers": headers_json(req),
            }),
            "Webhook Received",
        )
        .await;

        let data = match parsed {
            Some(Value::Object(map)) if !map.is_empty() => Value::Object(map),
            _ => {
                tracing::warn!("Empty or undecodable webhook body");
                self.log(json!("Empty webhook data"), FAILURE).await;
                return Err(WebhookError::Validation("Invalid request"));
            }
        };

        let notification = PaymentNotification::from_value(&data);
        let (Some(order_id), Some(status)) = (notification.order_id(), notification.status())
        else {
            tracing::warn!("Webhook missing order_id or status");
            self.log(
                json!({ "error": "Missing required fields", "data": data }),
                FAILURE,
            )
            .await;
            return Err(WebhookError::Validation("Missing required fields"));
        };

        self.verify_signature(req, &data).await?;

        let invoice_id = match order_id.invoice_id() {
            Some(id) => self
                .billing
                .validate_invoice(id, &self.config.name)
                .await
                .map_err(internal)?,
            None => None,
        };
        let Some(invoice_id) = invoice_id else {
            tracing::warn!(order_id = %order_id, "Webhook for unknown invoice");
            self.log(
                json!({ "error": "Invoice not found", "order_id": order_id }),
                FAILURE,
            )
            .await;
            return Err(WebhookError::NotFound);
        };

        if !notification.is_success() {
            tracing::info!(%invoice_id, status, "Non-final payment status reported");
            self.log(
                json!({ "status": status, "invoice_id": invoice_id, "data": data }),
                &format!("Payment Status: {}", status),
            )
            .await;
            return Ok(ack("Status recorded"));
        }

        let transaction_id =
            TransactionId::select(notification.provider_id(), &order_id, invoice_id);
        if transaction_id.is_synthetic() {
            tracing::debug!(%invoice_id, %transaction_id, "No provider id; using derived transaction id");
        }

        if self
            .billing
            .is_transaction_recorded(&transaction_id)
            .await
            .map_err(internal)?
        {
            tracing::info!(%invoice_id, %transaction_id, "Duplicate webhook delivery");
            self.log(
                json!({ "error": "Duplicate transaction", "transaction_id": transaction_id }),
                "Duplicate",
            )
            .await;
            return Ok(ack("Already processed"));
        }

        let invoice = self
            .billing
            .get_invoice(invoice_id)
            .await
            .map_err(internal)?;
        if invoice.is_some_and(|i| i.is_paid()) {
            tracing::info!(%invoice_id, "Invoice already paid");
            self.log(
                json!({ "message": "Invoice already paid", "invoice_id": invoice_id }),
                "Already Paid",
            )
            .await;
            return Ok(ack("Already paid"));
        }

        self.log(
            json!({
                "invoice_id": invoice_id,
                "transaction_id": transaction_id,
                "amount": notification.amount,
                "status": status,
                "data": data,
            }),
            "Success",
        )
        .await;

        self.apply_payment(invoice_id, transaction_id).await
    }

    /// Checks the signature header when a webhook key is configured.
    async fn verify_signature(&self, req: &InboundWebhook, data: &Value) -> Result<(), WebhookError> {
        let Some(key) = self.config.credentials.webhook_key() else {
            return Ok(());
        };

        let received = req
            .header("authorization")
            .or_else(|| req.header("signature"))
            .filter(|s| !s.is_empty());

        let Some(received) = received else {
            if self.config.require_signature {
                tracing::warn!("Unsigned webhook rejected");
                self.log(
                    json!({ "error": "Missing signature header", "data": data }),
                    FAILURE,
                )
                .await;
                return Err(WebhookError::Authentication);
            }
            tracing::warn!("Accepting unsigned webhook although a webhook key is configured");
            return Ok(());
        };

        let calculated = security::sign_payload(data, key).map_err(|e| {
            tracing::error!(error = %e, "Could not encode webhook for verification");
            WebhookError::Internal(e.to_string())
        })?;

        if !security::signatures_match(&calculated, received) {
            tracing::warn!("Webhook signature mismatch");
            self.log(
                json!({
                    "error": "Signature verification failed",
                    "received": received,
                    "calculated": calculated,
                    "data": data,
                }),
                FAILURE,
            )
            .await;
            return Err(WebhookError::Authentication);
        }
        Ok(())
    }

    /// Applies the payment with zero amount and fee, so the billing system
    /// credits the invoice from its own records.
    async fn apply_payment(
        &self,
        invoice_id: InvoiceId,
        transaction_id: TransactionId,
    ) -> Result<WebhookOutcome, WebhookError> {
        let payment = InvoicePayment {
            invoice_id,
            transaction_id: transaction_id.clone(),
            amount: 0,
            fee: 0,
            gateway: self.config.name.clone(),
        };

        match self.billing.add_invoice_payment(payment).await {
            Ok(()) => {
                tracing::info!(%invoice_id, %transaction_id, "Payment applied");
                Ok(ack("Payment processed"))
            }
            // Lost a race with a concurrent delivery of the same notification.
            Err(RepoError::Conflict(reason)) => {
                tracing::warn!(%invoice_id, %transaction_id, reason, "Payment already recorded");
                Ok(ack("Already processed"))
            }
            Err(e) => Err(internal(e)),
        }
    }

    async fn log(&self, data: Value, result: &str) {
        if let Err(e) = self
            .billing
            .log_transaction(&self.config.name, data, result)
            .await
        {
            tracing::error!(error = %e, result, "Failed to write gateway log");
        }
    }
}

fn ack(message: &str) -> WebhookOutcome {
    WebhookOutcome::Acknowledged(WebhookAck::ok(message))
}

fn internal(e: RepoError) -> WebhookError {
    tracing::error!(error = %e, "Billing system error during webhook processing");
    WebhookError::from(e)
}

fn headers_json(req: &InboundWebhook) -> Value {
    Value::Object(
        req.headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<String, Value>>(),
    )
}
