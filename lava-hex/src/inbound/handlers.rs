//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;

use lava_types::{
    BillingSystem, ConfigField, GatewayConfig, GatewayMetadata, InboundWebhook, InvoiceApi,
    PaymentLinkRequest, WebhookError, config_fields,
};

use crate::{LinkGenerator, WebhookOutcome, WebhookProcessor};

/// Application state shared across handlers.
pub struct AppState<B: BillingSystem, A: InvoiceApi> {
    pub config: Arc<GatewayConfig>,
    pub links: LinkGenerator<B, A>,
    pub webhooks: WebhookProcessor<B>,
}

impl<B: BillingSystem, A: InvoiceApi> AppState<B, A> {
    pub fn new(config: GatewayConfig, billing: Arc<B>, api: A) -> Self {
        let config = Arc::new(config);
        Self {
            links: LinkGenerator::new(config.clone(), billing.clone(), api),
            webhooks: WebhookProcessor::new(config.clone(), billing),
            config,
        }
    }
}

/// Wrapper to implement IntoResponse for WebhookError (orphan rule workaround).
///
/// The provider only looks at the status code, so the body is the bare
/// error text.
pub struct ApiError(pub WebhookError);

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &self.0 {
            // Storage details stay in the logs.
            WebhookError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        (status, message).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Gateway description for the billing host's admin UI.
#[derive(Debug, Serialize)]
pub struct GatewayInfo {
    pub module: &'static str,
    pub friendly_name: &'static str,
    pub enabled: bool,
    pub configured: bool,
    pub metadata: GatewayMetadata,
    pub config_fields: Vec<ConfigField>,
}

pub async fn gateway_info<B: BillingSystem, A: InvoiceApi>(
    State(state): State<Arc<AppState<B, A>>>,
) -> impl IntoResponse {
    Json(GatewayInfo {
        module: GatewayMetadata::MODULE,
        friendly_name: GatewayMetadata::FRIENDLY_NAME,
        enabled: state.config.enabled,
        configured: state.config.credentials.is_complete(),
        metadata: GatewayMetadata::get(),
        config_fields: config_fields(),
    })
}

/// Renders the pay button, or an alert when the link cannot be created.
///
/// Always 200: link errors are shown to the payer, not raised to the host.
#[tracing::instrument(skip(state, req), fields(invoice_id = %req.invoice_id))]
pub async fn payment_link<B: BillingSystem, A: InvoiceApi>(
    State(state): State<Arc<AppState<B, A>>>,
    Json(req): Json<PaymentLinkRequest>,
) -> Html<String> {
    Html(state.links.link_html(&req).await)
}

/// Provider notification endpoint. Accepts any method.
#[tracing::instrument(skip_all, fields(method = %method))]
pub async fn callback<B: BillingSystem, A: InvoiceApi>(
    State(state): State<Arc<AppState<B, A>>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let webhook = InboundWebhook {
        method: method.to_string(),
        headers: headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect(),
        body: body.to_vec(),
    };

    match state.webhooks.handle(&webhook).await? {
        WebhookOutcome::Ignored => Ok("OK".into_response()),
        WebhookOutcome::Acknowledged(ack) => Ok(Json(ack).into_response()),
    }
}

/// OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;

    Json(crate::openapi::ApiDoc::openapi())
}
