//! Inventory models
//!
//! The snapshot row is the one record mutated by more than one subsystem: PO
//! receipt increments it here, order fulfillment decrements it externally.
//! All mutations go through server-side deltas, never read-modify-write.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Current stock position for a SKU.
///
/// `product_name`, `category`, `brand` and `list_price` are denormalized
/// read-only hints from the external product catalog; the predictors use
/// them for their category, brand-strength and price-elasticity factors.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventorySnapshot {
    pub sku: String,
    pub product_name: Option<String>,
    pub qty_available: i64,
    pub safety_stock: i64,
    pub reorder_point: i64,
    pub lead_time_days: i32,
    pub last_restocked_at: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub list_price: Option<Decimal>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Kind of inventory-affecting event recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "inventory_change_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InventoryChangeType {
    PoReceipt,
    Sale,
    Adjustment,
}

impl InventoryChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryChangeType::PoReceipt => "po_receipt",
            InventoryChangeType::Sale => "sale",
            InventoryChangeType::Adjustment => "adjustment",
        }
    }
}

/// One append-only audit entry per inventory-affecting event.
///
/// `qty_before` and `qty_after` are real values taken from the row being
/// updated, inside the same transaction as the update itself.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryAuditLogEntry {
    pub id: Uuid,
    pub sku: String,
    pub change_type: InventoryChangeType,
    pub qty_change: i64,
    pub qty_before: i64,
    pub qty_after: i64,
    /// Links back to the originating document, e.g. a PO number.
    pub reference_id: Option<String>,
    pub reason: String,
    pub changed_by: String,
    pub created_at: DateTime<Utc>,
}
