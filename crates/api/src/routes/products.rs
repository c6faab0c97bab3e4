//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::Product;
use ledger::{InventoryLedger, OrderStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
    pub stock: u32,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub stock: u32,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.id.to_string(),
            name: product.name,
            stock: product.stock,
        }
    }
}

/// POST /products — register a product with its initial stock level.
#[tracing::instrument(skip(state, req))]
pub async fn create<L: OrderStore + InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), ApiError> {
    if req.id.is_empty() {
        return Err(ApiError::BadRequest("product id must not be empty".to_string()));
    }

    let product = Product::new(req.id, req.name, req.stock);
    state.ledger.insert_product(&product).await?;

    Ok((axum::http::StatusCode::CREATED, Json(product.into())))
}

/// GET /products — list all products with current stock.
#[tracing::instrument(skip(state))]
pub async fn list<L: OrderStore + InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.ledger.list_products().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/:id — look up one product.
#[tracing::instrument(skip(state))]
pub async fn get<L: OrderStore + InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .ledger
        .get_product(&ProductId::new(id.clone()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(product.into()))
}
