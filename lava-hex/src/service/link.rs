//! Payment link generation.

use std::sync::Arc;

use serde_json::Value;

use lava_repo::security;
use lava_types::{
    BillingSystem, CreateInvoicePayload, GatewayConfig, InvoiceApi, LinkError, ModuleCall, OrderId,
    PaymentLinkRequest,
};

use super::hook_url;
use crate::render;

/// Module name recorded with outbound calls.
const MODULE: &str = "Lava";

/// Action recorded with invoice-creation calls.
const CREATE_ACTION: &str = "/business/invoice/create";

/// Creates provider invoices and renders the payer's link.
pub struct LinkGenerator<B: BillingSystem, A: InvoiceApi> {
    config: Arc<GatewayConfig>,
    billing: Arc<B>,
    api: A,
}

impl<B: BillingSystem, A: InvoiceApi> LinkGenerator<B, A> {
    pub fn new(config: Arc<GatewayConfig>, billing: Arc<B>, api: A) -> Self {
        Self {
            config,
            billing,
            api,
        }
    }

    /// Builds the unsigned request body for an invoice.
    pub fn build_payload(
        &self,
        req: &PaymentLinkRequest,
        order_id: &OrderId,
    ) -> CreateInvoicePayload {
        let creds = &self.config.credentials;
        let system_url = req
            .system_url
            .as_deref()
            .unwrap_or(&self.config.system_url);

        CreateInvoicePayload {
            sum: req.amount,
            order_id: order_id.to_string(),
            shop_id: creds.shop_id.clone(),
            hook_url: Some(hook_url(system_url)),
            success_url: Some(req.return_url.clone()),
            fail_url: Some(req.return_url.clone()),
            expire: Some(creds.expire_minutes()),
            comment: Some(req.description.clone()),
        }
    }

    /// Creates a provider invoice and returns the payer redirect URL.
    #[tracing::instrument(skip(self, req), fields(invoice_id = %req.invoice_id))]
    pub async fn create_link(&self, req: &PaymentLinkRequest) -> Result<String, LinkError> {
        let creds = &self.config.credentials;
        if !creds.is_complete() {
            tracing::warn!("Shop ID or secret key missing; cannot create payment link");
            return Err(LinkError::Configuration);
        }

        let order_id = OrderId::generate(req.invoice_id);
        let payload = serde_json::to_value(self.build_payload(req, &order_id))
            .and_then(|body| security::sign_request(body, &creds.secret_key))
            .map_err(|e| LinkError::Transport(format!("Failed to encode request: {}", e)))?;

        let reply = match self.api.create_invoice(&payload).await {
            Ok(reply) => {
                self.record_call(&payload, reply.to_string()).await;
                reply
            }
            Err(e) => {
                tracing::error!(error = %e, order_id = %order_id, "Provider call failed");
                let detail = match &e {
                    LinkError::Transport(detail) => detail.clone(),
                    other => other.to_string(),
                };
                self.record_call(&payload, detail).await;
                return Err(e);
            }
        };

        let url = interpret_reply(&reply)?;
        tracing::info!(order_id = %order_id, "Payment link created");
        Ok(url)
    }

    /// Renders either the pay button or an error alert.
    pub async fn link_html(&self, req: &PaymentLinkRequest) -> String {
        match self.create_link(req).await {
            Ok(url) => render::pay_button(&url, &req.label),
            Err(e) => {
                tracing::warn!(invoice_id = %req.invoice_id, error = %e, "Rendering link error");
                render::alert(&e)
            }
        }
    }

    async fn record_call(&self, request: &Value, response: String) {
        let call = ModuleCall {
            module: MODULE.to_string(),
            action: CREATE_ACTION.to_string(),
            request: request.clone(),
            response,
            created_at: chrono::Utc::now(),
        };
        if let Err(e) = self.billing.log_module_call(call).await {
            tracing::error!(error = %e, "Failed to record provider call");
        }
    }
}

/// Extracts the redirect URL from a provider reply.
///
/// Checks, in order: an empty reply, a non-empty `error`, a `status` other
/// than the number 200, and finally `data.url`.
pub fn interpret_reply(reply: &Value) -> Result<String, LinkError> {
    if is_blank(reply) {
        return Err(LinkError::Transport("empty reply".into()));
    }

    if let Some(error) = reply.get("error").filter(|e| !is_blank(e)) {
        let message = match error {
            Value::Array(_) | Value::Object(_) => pretty(error),
            other => scalar_text(other),
        };
        return Err(LinkError::Upstream(message));
    }

    if let Some(status) = reply.get("status").filter(|s| !s.is_null()) {
        if status.as_i64() != Some(200) {
            let message = reply
                .get("message")
                .filter(|m| !m.is_null())
                .map(scalar_text)
                .unwrap_or_else(|| format!("Unknown error (status: {})", scalar_text(status)));
            return Err(LinkError::Upstream(message));
        }
    }

    match reply.pointer("/data/url") {
        Some(Value::String(url)) => Ok(url.clone()),
        Some(url @ Value::Number(_)) => Ok(url.to_string()),
        _ => Err(LinkError::InvalidResponse(pretty(reply))),
    }
}

/// Values the host platform treats as empty.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pretty JSON with four-space indentation, for diagnostics.
fn pretty(value: &Value) -> String {
    use serde::Serialize;

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    match value.serialize(&mut ser) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_with_url() {
        let reply = json!({ "status": 200, "data": { "url": "https://pay.lava.ru/abc" } });
        assert_eq!(interpret_reply(&reply).unwrap(), "https://pay.lava.ru/abc");
    }

    #[test]
    fn test_reply_with_string_error() {
        let reply = json!({ "error": "Shop not found", "status": 404 });
        assert!(matches!(
            interpret_reply(&reply),
            Err(LinkError::Upstream(m)) if m == "Shop not found"
        ));
    }

    #[test]
    fn test_reply_with_structured_error() {
        let reply = json!({ "error": { "sum": ["too small"] } });
        let Err(LinkError::Upstream(message)) = interpret_reply(&reply) else {
            panic!("expected upstream error");
        };
        assert!(message.contains("\"sum\""));
        assert!(message.contains("too small"));
    }

    #[test]
    fn test_reply_with_bad_status() {
        let reply = json!({ "status": 401, "message": "Unauthorized" });
        assert!(matches!(
            interpret_reply(&reply),
            Err(LinkError::Upstream(m)) if m == "Unauthorized"
        ));

        let reply = json!({ "status": 500 });
        assert!(matches!(
            interpret_reply(&reply),
            Err(LinkError::Upstream(m)) if m == "Unknown error (status: 500)"
        ));

        let reply = json!({ "status": "200", "data": { "url": "https://x" } });
        assert!(matches!(interpret_reply(&reply), Err(LinkError::Upstream(_))));
    }

    #[test]
    fn test_reply_without_url_is_invalid() {
        let reply = json!({ "status": 200, "data": { "id": "<uuid>" } });
        let Err(LinkError::InvalidResponse(raw)) = interpret_reply(&reply) else {
            panic!("expected invalid response");
        };
        assert!(raw.contains("<uuid>"));
        assert!(raw.contains("\n    \"data\""));
    }

    #[test]
    fn test_empty_error_field_is_ignored() {
        let reply = json!({ "error": "", "data": { "url": "https://x" } });
        assert_eq!(interpret_reply(&reply).unwrap(), "https://x");
    }

    #[test]
    fn test_empty_reply_is_transport_error() {
        assert!(matches!(
            interpret_reply(&json!({})),
            Err(LinkError::Transport(_))
        ));
    }
}
