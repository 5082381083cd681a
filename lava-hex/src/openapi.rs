//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use lava_types::dto::{PaymentLinkRequest, WebhookAck};
use utoipa::OpenApi;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Gateway metadata and configuration schema
#[utoipa::path(
    get,
    path = "/api/gateway",
    tag = "gateway",
    responses(
        (status = 200, description = "Module name, activation state, metadata and settings fields", body = inline(serde_json::Value))
    )
)]
async fn gateway_info() {}

/// Render the payment button for an invoice
#[utoipa::path(
    post,
    path = "/api/payment-link",
    tag = "gateway",
    request_body = PaymentLinkRequest,
    responses(
        (status = 200, description = "HTML pay button, or an HTML alert when the link could not be created", body = String, content_type = "text/html")
    )
)]
async fn payment_link() {}

/// Provider payment notification
#[utoipa::path(
    post,
    path = "/callback/lava",
    tag = "webhook",
    request_body(content = inline(serde_json::Value), description = "Notification with invoice_id, order_id, status, amount, credited, pay_time"),
    params(
        ("Authorization" = Option<String>, Header, description = "Hex HMAC-SHA256 of the key-sorted body, made with the webhook key"),
        ("Signature" = Option<String>, Header, description = "Fallback signature header")
    ),
    responses(
        (status = 200, description = "Notification processed", body = WebhookAck),
        (status = 400, description = "Gateway not activated, or malformed notification", body = String),
        (status = 403, description = "Invalid signature", body = String),
        (status = 404, description = "Invoice not found", body = String)
    )
)]
async fn callback() {}

/// OpenAPI documentation for the gateway service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lava.ru Gateway API",
        version = "1.0.0",
        description = "Payment link generation and webhook receiver for the Lava.ru payment gateway.\n\nNon-POST requests to `/callback/lava` are answered with a bare `OK` and not processed.",
        license(name = "MIT"),
    ),
    paths(health, gateway_info, payment_link, callback),
    components(schemas(PaymentLinkRequest, WebhookAck)),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "gateway", description = "Billing host integration"),
        (name = "webhook", description = "Provider notifications"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/health", "/api/gateway", "/api/payment-link", "/callback/lava"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
