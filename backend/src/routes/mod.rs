//! Route definitions for the Demand Replenishment Platform

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Forecast engine
        .nest("/forecasts", forecast_routes())
        // Inventory snapshots, reorder advice and audit log
        .nest("/inventory", inventory_routes())
        // Purchase order lifecycle
        .nest("/purchase-orders", purchase_order_routes())
        // Supplier and price list management
        .nest("/suppliers", supplier_routes())
        // Background job status and manual triggers
        .nest("/jobs", job_routes())
        // In-app notifications
        .nest("/notifications", notification_routes())
}

/// Forecast engine routes
fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(handlers::generate_forecast))
        .route("/batch", post(handlers::batch_generate_forecasts))
        .route("/accuracy/:forecast_id", get(handlers::get_forecast_accuracy))
        .route("/:sku/latest", get(handlers::get_latest_forecast))
        .route("/:sku/history", get(handlers::list_forecasts))
}

/// Inventory routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/snapshots", get(handlers::list_snapshots))
        .route("/snapshots/:sku", get(handlers::get_snapshot))
        .route(
            "/reorder-recommendations",
            get(handlers::get_reorder_recommendations),
        )
        .route("/audit-log", get(handlers::get_audit_log))
}

/// Purchase order routes
fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchase_orders).post(handlers::create_draft_po),
        )
        .route(
            "/:po_id",
            get(handlers::get_purchase_order).put(handlers::update_purchase_order),
        )
        .route("/:po_id/approve", post(handlers::approve_purchase_order))
        .route("/:po_id/send", post(handlers::send_purchase_order))
        .route("/:po_id/receive", post(handlers::receive_purchase_order))
        .route("/:po_id/cancel", post(handlers::cancel_purchase_order))
}

/// Supplier routes
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier).put(handlers::update_supplier),
        )
        .route(
            "/:supplier_id/prices",
            get(handlers::list_supplier_prices).post(handlers::upsert_supplier_price),
        )
}

/// Job queue routes
fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::get_job_status))
        .route("/failed", get(handlers::get_failed_jobs))
        .route("/forecast-sweep", post(handlers::trigger_forecast_sweep))
}

/// Notification routes
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/:notification_id/read", put(handlers::mark_notification_read))
}
