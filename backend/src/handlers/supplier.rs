//! HTTP handlers for supplier and price list management

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::{Supplier, SupplierPrice};

use crate::error::AppResult;
use crate::services::supplier::{
    CreateSupplierInput, SupplierService, UpdateSupplierInput, UpsertPriceInput,
};
use crate::AppState;

/// Create a supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.create(input).await?;
    Ok(Json(supplier))
}

/// List suppliers, active first
pub async fn list_suppliers(State(state): State<AppState>) -> AppResult<Json<Vec<Supplier>>> {
    let service = SupplierService::new(state.db);
    let suppliers = service.list().await?;
    Ok(Json(suppliers))
}

/// Get one supplier
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.get(id).await?;
    Ok(Json(supplier))
}

/// Update a supplier
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.update(id, input).await?;
    Ok(Json(supplier))
}

/// Upsert the current price for (supplier, sku)
pub async fn upsert_supplier_price(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpsertPriceInput>,
) -> AppResult<Json<SupplierPrice>> {
    let service = SupplierService::new(state.db);
    let price = service.upsert_price(id, input).await?;
    Ok(Json(price))
}

/// Current price list for a supplier
pub async fn list_supplier_prices(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<SupplierPrice>>> {
    let service = SupplierService::new(state.db);
    let prices = service.list_prices(id).await?;
    Ok(Json(prices))
}
