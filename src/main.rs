//! Webhook receiver binary.

use std::sync::Arc;

use axum::http::HeaderName;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use payment_webhooks::adapters::http::{webhook_router, WebhookAppState};
use payment_webhooks::adapters::{
    InMemoryIdempotencyStore, LoggingBillingActions, PostgresIdempotencyStore, SystemClock,
};
use payment_webhooks::application::register_billing_handlers;
use payment_webhooks::config::AppConfig;
use payment_webhooks::domain::webhook::{HandlerRegistry, SignatureVerifier, WebhookDispatcher};
use payment_webhooks::ports::IdempotencyStore;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);
    tracing::info!(
        environment = %config.server.environment,
        path = %config.webhook.path,
        "Starting payment webhook receiver"
    );

    let policy = config.webhook.retry_policy();
    let store: Arc<dyn IdempotencyStore> = match &config.database {
        Some(database) => {
            tracing::info!(url = %database.redacted_url(), "Using PostgreSQL idempotency store");
            let pool = payment_webhooks::adapters::postgres::connect(database).await?;
            Arc::new(PostgresIdempotencyStore::with_policy(pool, policy))
        }
        None => {
            tracing::warn!("No database configured, processing records are kept in memory");
            Arc::new(InMemoryIdempotencyStore::with_policy(policy))
        }
    };

    let mut registry = HandlerRegistry::new();
    register_billing_handlers(&mut registry, Arc::new(LoggingBillingActions::new()));
    tracing::info!(types = ?registry.registered_types(), "Webhook handlers registered");

    let dispatcher = WebhookDispatcher::new(
        SignatureVerifier::new(config.webhook.verifier_config()),
        store,
        Arc::new(registry),
        Arc::new(SystemClock),
    );

    let signature_header = HeaderName::try_from(config.webhook.signature_header.as_str())?;
    let state = WebhookAppState::new(Arc::new(dispatcher), signature_header);
    let app = webhook_router(state, &config.webhook.path, config.webhook.max_body_bytes);

    let listener = TcpListener::bind(config.server.socket_addr()?).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.server.environment.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
