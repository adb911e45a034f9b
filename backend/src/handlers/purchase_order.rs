//! HTTP handlers for the purchase order lifecycle

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{PoStatus, PurchaseOrder};

use crate::error::AppResult;
use crate::services::purchase_order::{PurchaseOrderService, UpdatePoInput};
use crate::AppState;

/// Request to generate a draft PO
#[derive(Debug, Deserialize)]
pub struct DraftPoRequest {
    pub skus: Vec<String>,
    pub supplier_id: Uuid,
    pub reason: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct ApprovePoRequest {
    pub approved_by: String,
}

#[derive(Debug, Deserialize)]
pub struct ReceivePoRequest {
    pub received_by: String,
}

#[derive(Debug, Deserialize)]
pub struct PoListQuery {
    pub status: Option<PoStatus>,
}

/// Generate a draft purchase order from forecasts and supplier prices
pub async fn create_draft_po(
    State(state): State<AppState>,
    Json(request): Json<DraftPoRequest>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db, state.predictor);
    let po = service
        .generate_draft(
            &request.skus,
            request.supplier_id,
            request.reason,
            &request.created_by,
        )
        .await?;
    Ok(Json(po))
}

/// List purchase orders, optionally by status
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<PoListQuery>,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    let service = PurchaseOrderService::new(state.db, state.predictor);
    let orders = service.list(query.status).await?;
    Ok(Json(orders))
}

/// Get one purchase order
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db, state.predictor);
    let po = service.get(id).await?;
    Ok(Json(po))
}

/// Edit a draft purchase order
pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePoInput>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db, state.predictor);
    let po = service.update(id, input).await?;
    Ok(Json(po))
}

/// Approve a draft purchase order
pub async fn approve_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApprovePoRequest>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db, state.predictor);
    let po = service.approve(id, &request.approved_by).await?;
    Ok(Json(po))
}

/// Mark an approved purchase order as sent
pub async fn send_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db, state.predictor);
    let po = service.send(id).await?;
    Ok(Json(po))
}

/// Receive a sent purchase order, reconciling inventory atomically
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReceivePoRequest>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db, state.predictor);
    let po = service.receive(id, &request.received_by).await?;
    Ok(Json(po))
}

/// Cancel a purchase order (disallowed once received)
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db, state.predictor);
    let po = service.cancel(id).await?;
    Ok(Json(po))
}
