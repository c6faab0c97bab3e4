//! Stock deduction endpoint.
//!
//! This is where clients (and the saga coordinator's retries) land on
//! redelivery: the handler answers replays from the idempotency ledger
//! instead of deducting twice.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{OrderId, ProductId};
use ledger::{InventoryLedger, OrderStore};
use saga::{DeductOutcome, DeductStock, DeductionService};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct DeductRequest {
    pub product_id: String,
    pub quantity: u32,
    /// Idempotency key: the order this deduction belongs to.
    pub order_id: uuid::Uuid,
}

#[derive(Serialize)]
pub struct DeductResponse {
    pub success: bool,
    pub message: String,
}

/// POST /inventory/deduct — deduct stock, exactly once per order ID.
#[tracing::instrument(skip(state, req))]
pub async fn deduct<L: OrderStore + InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<DeductRequest>,
) -> Result<Json<DeductResponse>, ApiError> {
    let outcome = state
        .deduction
        .deduct(DeductStock {
            product_id: ProductId::new(req.product_id),
            quantity: req.quantity,
            operation_id: OrderId::from_uuid(req.order_id),
        })
        .await?;

    let message = match outcome {
        DeductOutcome::Deducted => "stock deducted".to_string(),
        DeductOutcome::AlreadyDeducted => "stock already deducted for this order".to_string(),
    };

    Ok(Json(DeductResponse {
        success: true,
        message,
    }))
}
