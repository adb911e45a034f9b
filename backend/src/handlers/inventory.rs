//! HTTP handlers for inventory snapshots, reorder recommendations and the
//! audit log

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use shared::models::{InventoryAuditLogEntry, InventorySnapshot};

use crate::error::AppResult;
use crate::services::inventory::InventoryService;
use crate::services::reorder::{LowStockRecommendation, ReorderService};
use crate::AppState;

/// List all inventory snapshots
pub async fn list_snapshots(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<InventorySnapshot>>> {
    let service = InventoryService::new(state.db);
    let snapshots = service.list_snapshots().await?;
    Ok(Json(snapshots))
}

/// Get the snapshot for one SKU
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<Json<InventorySnapshot>> {
    let service = InventoryService::new(state.db);
    let snapshot = service.get_snapshot(&sku).await?;
    Ok(Json(snapshot))
}

/// Low-stock recommendations, high urgency first
pub async fn get_reorder_recommendations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LowStockRecommendation>>> {
    let service = ReorderService::new(state.db);
    let recommendations = service.low_stock_recommendations().await?;
    Ok(Json(recommendations))
}

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub sku: Option<String>,
    pub limit: Option<i64>,
}

/// Inventory audit log, newest first
pub async fn get_audit_log(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> AppResult<Json<Vec<InventoryAuditLogEntry>>> {
    let service = InventoryService::new(state.db);
    let entries = service
        .list_audit_log(query.sku.as_deref(), query.limit.unwrap_or(100).clamp(1, 500))
        .await?;
    Ok(Json(entries))
}
