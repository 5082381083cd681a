//! # Lava Gateway Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the billing adapter
//! - Create the provider API client
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lava_client::LavaClient;
use lava_hex::inbound::HttpServer;
use lava_repo::build_repo;

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // gRPC exporter with batch processing; endpoint comes from OTEL_EXPORTER_OTLP_ENDPOINT
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("lava-gateway"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // OpenTelemetry export is opt-in
    let otel = if std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        Some(init_tracer()?)
    } else {
        None
    };
    let telemetry = otel
        .as_ref()
        .map(|(tracer, _)| tracing_opentelemetry::layer().with_tracer(tracer.clone()));

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lava_app=debug,lava_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting Lava.ru gateway on port {}", config.port);
    tracing::info!("Using database: {}", config.database_url);
    tracing::info!(
        enabled = config.gateway.enabled,
        configured = config.gateway.credentials.is_complete(),
        verify_webhooks = config.gateway.credentials.webhook_key().is_some(),
        require_signature = config.gateway.require_signature,
        "Gateway settings loaded"
    );
    if !config.gateway.credentials.is_complete() {
        tracing::warn!("LAVA_SHOP_ID or LAVA_SECRET_KEY missing; payment links will show an error");
    }

    // Build billing adapter (handles connection and schema)
    let repo = build_repo(&config.database_url).await?;

    // Provider API client
    let api = LavaClient::with_base_url(&config.api_url)?;

    // Create and run the HTTP server
    let server = HttpServer::new(config.gateway, Arc::new(repo), api);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    if let Some((_, provider)) = otel {
        let _ = provider.shutdown();
    }
    Ok(())
}
