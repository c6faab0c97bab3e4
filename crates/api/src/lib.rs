//! HTTP API server with observability for the order saga system.
//!
//! Provides REST endpoints for order placement, stock deduction, and the
//! product catalog, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::Product;
use ledger::{InventoryLedger, LedgerError, OrderStore};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{DeductionHandler, OrderCoordinator, QuantityTriggeredDelay};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L: OrderStore + InventoryLedger + Clone + 'static>(
    state: Arc<AppState<L>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<L>))
        .route("/orders/{id}", get(routes::orders::get::<L>))
        .route("/inventory/deduct", post(routes::inventory::deduct::<L>))
        .route("/products", post(routes::products::create::<L>))
        .route("/products", get(routes::products::list::<L>))
        .route("/products/{id}", get(routes::products::get::<L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state: latency policy, deduction handler, and
/// coordinator wired over the given ledger per the configuration.
pub fn create_default_state<L: OrderStore + InventoryLedger + Clone + 'static>(
    ledger: L,
    config: &Config,
) -> Arc<AppState<L>> {
    let latency = Arc::new(QuantityTriggeredDelay::new(
        config.slow_deduct_trigger_qty,
        config.slow_deduct_delay,
    ));
    let deduction = Arc::new(DeductionHandler::new(ledger.clone(), latency));
    let coordinator =
        OrderCoordinator::new(ledger.clone(), Arc::clone(&deduction), config.order_deadline);

    Arc::new(AppState {
        coordinator,
        deduction,
        ledger,
    })
}

/// Seeds a demo product catalog when the ledger holds no products yet.
pub async fn seed_products<L: InventoryLedger>(ledger: &L) -> Result<(), LedgerError> {
    if !ledger.list_products().await?.is_empty() {
        return Ok(());
    }

    for product in [
        Product::new("P-001", "Widget", 100),
        Product::new("P-002", "Gadget", 50),
        Product::new("P-003", "Gizmo", 0),
    ] {
        ledger.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, stock = product.stock, "seeded product");
    }

    Ok(())
}
