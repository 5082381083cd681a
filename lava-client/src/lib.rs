//! # Lava Client
//!
//! A typed client for the Lava.ru business API, plus a small sender used
//! to replay signed webhooks against a running receiver.

use std::time::Duration;

use lava_types::{InvoiceApi, LinkError};
use reqwest::{Client, header, redirect};
use serde_json::Value;

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.lava.ru";

/// Invoice creation endpoint, relative to the base URL.
pub const CREATE_INVOICE_PATH: &str = "/business/invoice/create";

/// Upper bound for a single provider call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn build_http() -> Result<Client, ClientError> {
    Ok(Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .redirect(redirect::Policy::limited(10))
        .http1_only()
        .build()?)
}

/// Lava business API client.
pub struct LavaClient {
    base_url: String,
    http: Client,
}

impl LavaClient {
    /// Creates a client for the production API.
    pub fn new() -> Result<Self, ClientError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against another base URL (sandbox, local stub).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: build_http()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts an already signed invoice-creation body.
    ///
    /// Any HTTP status is accepted; the provider reports failures in the
    /// JSON body, so only transport and decoding errors surface here.
    pub async fn create_invoice(&self, signed_body: &Value) -> Result<Value, ClientError> {
        self.post(CREATE_INVOICE_PATH, signed_body).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        tracing::debug!(%status, path, "Provider responded");
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait::async_trait]
impl InvoiceApi for LavaClient {
    async fn create_invoice(&self, signed_body: &Value) -> Result<Value, LinkError> {
        LavaClient::create_invoice(self, signed_body)
            .await
            .map_err(|e| LinkError::Transport(e.to_string()))
    }
}

/// Sends webhook bodies to a receiver, the way the provider does.
pub struct WebhookSender {
    http: Client,
}

impl WebhookSender {
    pub fn new() -> Result<Self, ClientError> {
        Ok(Self {
            http: build_http()?,
        })
    }

    /// Posts `body` to `url`, with the signature in `Authorization` when given.
    ///
    /// Returns the receiver's status code and body text.
    pub async fn send(
        &self,
        url: &str,
        body: &Value,
        signature: Option<&str>,
    ) -> Result<(u16, String), ClientError> {
        let mut req = self.http.post(url).json(body);
        if let Some(signature) = signature {
            req = req.header(header::AUTHORIZATION, signature);
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        Ok((status, resp.text().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, routing::post};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = LavaClient::with_base_url("https://api.lava.ru/").unwrap();
        assert_eq!(client.base_url(), "https://api.lava.ru");
    }

    #[tokio::test]
    async fn test_create_invoice_posts_json() {
        let app = Router::new().route(
            CREATE_INVOICE_PATH,
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers[header::ACCEPT], "application/json");
                Json(serde_json::json!({
                    "status": 200,
                    "data": { "url": format!("https://pay.lava.ru/{}", body["orderId"].as_str().unwrap()) }
                }))
            }),
        );
        let client = LavaClient::with_base_url(spawn(app).await).unwrap();

        let reply = client
            .create_invoice(&serde_json::json!({ "orderId": "1_a", "signature": "x" }))
            .await
            .unwrap();

        assert_eq!(reply["data"]["url"], "https://pay.lava.ru/1_a");
    }

    #[tokio::test]
    async fn test_error_status_still_returns_body() {
        let app = Router::new().route(
            CREATE_INVOICE_PATH,
            post(|| async {
                (
                    axum::http::StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({ "status": 422, "error": { "sum": "too small" } })),
                )
            }),
        );
        let client = LavaClient::with_base_url(spawn(app).await).unwrap();

        let reply = client
            .create_invoice(&serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(reply["status"], 422);
    }

    #[tokio::test]
    async fn test_non_json_reply_is_transport_error() {
        let app = Router::new().route(CREATE_INVOICE_PATH, post(|| async { "<html>502</html>" }));
        let client = LavaClient::with_base_url(spawn(app).await).unwrap();

        let result = InvoiceApi::create_invoice(&client, &serde_json::json!({})).await;

        assert!(matches!(result, Err(LinkError::Transport(_))));
    }

    #[tokio::test]
    async fn test_webhook_sender_sets_authorization() {
        let app = Router::new().route(
            "/callback/lava",
            post(|headers: HeaderMap| async move {
                headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string()
            }),
        );
        let base = spawn(app).await;
        let sender = WebhookSender::new().unwrap();

        let (status, body) = sender
            .send(
                &format!("{}/callback/lava", base),
                &serde_json::json!({ "status": "success" }),
                Some("abc123"),
            )
            .await
            .unwrap();

        assert_eq!(status, 200);
        assert_eq!(body, "abc123");
    }
}
