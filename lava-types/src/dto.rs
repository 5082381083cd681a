//! Data Transfer Objects for the provider API and our HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::InvoiceId;

// ─────────────────────────────────────────────────────────────────────────────
// Payment link DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to render a payment link for an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentLinkRequest {
    /// Billing-system invoice id
    #[schema(value_type = i64, example = 482)]
    pub invoice_id: InvoiceId,
    /// Shown to the payer on the provider page
    #[schema(example = "Invoice #482")]
    pub description: String,
    /// Amount due in major units
    #[schema(example = 1500.0)]
    pub amount: f64,
    /// Where the payer lands after paying or cancelling
    #[schema(example = "https://billing.example.com/viewinvoice.php?id=482")]
    pub return_url: String,
    /// Base URL of the billing system; defaults to the configured one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_url: Option<String>,
    /// Button label
    #[serde(default = "default_label")]
    #[schema(example = "Pay Now")]
    pub label: String,
}

fn default_label() -> String {
    "Pay Now".to_string()
}

/// Body sent to `POST /business/invoice/create`, before signing.
///
/// Optional fields are skipped rather than sent as `null`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoicePayload {
    pub sum: f64,
    pub order_id: String,
    pub shop_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhook DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// A raw inbound webhook call, independent of the HTTP framework.
#[derive(Debug, Clone, Default)]
pub struct InboundWebhook {
    pub method: String,
    /// Header names as received; lookups are case-insensitive
    pub headers: Vec<(String, String)>,
    /// Raw body bytes; not assumed to be valid UTF-8
    pub body: Vec<u8>,
}

impl InboundWebhook {
    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }

    /// First header value whose name matches case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// JSON acknowledgement returned for processed webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "Payment processed")]
    pub message: String,
}

impl WebhookAck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Audit log DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// An entry of the billing system's gateway transaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayLogEntry {
    pub gateway: String,
    pub data: serde_json::Value,
    /// Outcome label, e.g. `Success`, `Failure`, `Duplicate`
    pub result: String,
    pub created_at: DateTime<Utc>,
}

/// A recorded outbound provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCall {
    pub module: String,
    pub action: String,
    pub request: serde_json::Value,
    pub response: String,
    pub created_at: DateTime<Utc>,
}
