//! Bloomstock HTTP server.
//!
//! Stock reservation service with oversell prevention, time-boxed checkout
//! holds, and a batch sync endpoint for client carts.

use bloomstock::holds::spawn_sweeper;
use bloomstock::ledger::{MemoryStockStore, PostgresStockStore};
use bloomstock::payment_gateway::MockPaymentGateway;
use bloomstock::server::{build_router, AppState};
use bloomstock::{metrics, Config, HoldLedger, OrderLedger, StockStore};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bloomstock=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Bloomstock stock service");

    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        hold_ttl_secs = config.holds.ttl_secs,
        "Configuration loaded"
    );

    metrics::register_metrics();

    // Ledger backend: Postgres when configured, in-memory otherwise.
    let store: Arc<dyn StockStore> = match &config.store.database_url {
        Some(url) => {
            info!("Connecting to Postgres stock ledger...");
            let store = PostgresStockStore::connect(url, config.store.max_connections).await?;
            info!("Stock ledger connected");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, running on the in-memory stock ledger");
            Arc::new(MemoryStockStore::new())
        }
    };

    let holds = Arc::new(HoldLedger::new(store.clone(), config.holds.ttl()));
    let orders = Arc::new(OrderLedger::new());
    let sweeper = spawn_sweeper(
        holds.clone(),
        orders.clone(),
        config.holds.sweep_interval(),
        config.orders.retention(),
    );

    let state = AppState::new(store, holds, orders, MockPaymentGateway::shared());
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server shut down");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
