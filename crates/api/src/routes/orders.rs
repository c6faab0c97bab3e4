//! Order placement and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{OrderId, ProductId};
use domain::Order;
use ledger::{InventoryLedger, OrderStore};
use saga::{DeductionHandler, OrderCoordinator};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<L>
where
    L: OrderStore + InventoryLedger + Clone + 'static,
{
    pub coordinator: OrderCoordinator<L, DeductionHandler<L>>,
    pub deduction: Arc<DeductionHandler<L>>,
    pub ledger: L,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub product_id: String,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub status: String,
    pub created_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            order_id: order.id.to_string(),
            product_id: order.product_id.to_string(),
            quantity: order.quantity,
            status: order.status.as_str().to_string(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order and run the saga to a terminal state.
#[tracing::instrument(skip(state, req))]
pub async fn create<L: OrderStore + InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let order = state
        .coordinator
        .place_order(ProductId::new(req.product_id), req.quantity)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<L: OrderStore + InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .ledger
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(order.into()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
