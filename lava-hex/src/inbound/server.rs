//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get, post},
};
use tower_http::trace::TraceLayer;

use lava_types::{BillingSystem, GatewayConfig, InvoiceApi};

use super::handlers::{self, AppState};
use crate::service::CALLBACK_PATH;

/// HTTP Server for the gateway endpoints.
pub struct HttpServer<B: BillingSystem, A: InvoiceApi> {
    state: Arc<AppState<B, A>>,
}

impl<B: BillingSystem, A: InvoiceApi> HttpServer<B, A> {
    /// Creates a new HTTP server over the given billing system and provider API.
    pub fn new(config: GatewayConfig, billing: Arc<B>, api: A) -> Self {
        Self {
            state: Arc::new(AppState::new(config, billing, api)),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/gateway", get(handlers::gateway_info::<B, A>))
            .route("/api/payment-link", post(handlers::payment_link::<B, A>))
            .route(CALLBACK_PATH, any(handlers::callback::<B, A>))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
