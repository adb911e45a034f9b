//! Inventory gateway: snapshot reads, server-side stock deltas and the
//! append-only audit trail.
//!
//! The snapshot row is shared with the external order-fulfillment
//! collaborator, so every mutation is a delta applied in SQL
//! (`qty_available = qty_available + $n`), never a read-modify-write on a
//! value held in process.

use sqlx::{PgPool, Postgres, Transaction};

use shared::models::{InventoryAuditLogEntry, InventoryChangeType, InventorySnapshot};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// A planned audit entry with real before/after quantities, produced inside
/// the same transaction as the delta it records.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDelta {
    pub sku: String,
    pub qty_change: i64,
    pub qty_before: i64,
    pub qty_after: i64,
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current snapshot for one SKU.
    pub async fn get_snapshot(&self, sku: &str) -> AppResult<InventorySnapshot> {
        sqlx::query_as::<_, InventorySnapshot>(
            r#"
            SELECT sku, product_name, qty_available, safety_stock, reorder_point, lead_time_days,
                   last_restocked_at, category, brand, list_price, is_active, updated_at
            FROM inventory_snapshots
            WHERE sku = $1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NoInventoryRecord(sku.to_string()))
    }

    /// All snapshots, active first then by SKU.
    pub async fn list_snapshots(&self) -> AppResult<Vec<InventorySnapshot>> {
        let snapshots = sqlx::query_as::<_, InventorySnapshot>(
            r#"
            SELECT sku, product_name, qty_available, safety_stock, reorder_point, lead_time_days,
                   last_restocked_at, category, brand, list_price, is_active, updated_at
            FROM inventory_snapshots
            ORDER BY is_active DESC, sku ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(snapshots)
    }

    /// Apply a stock delta inside an existing transaction, marking the row
    /// restocked, and return the real before/after quantities.
    ///
    /// The guard clause refuses deltas that would drive `qty_available`
    /// negative; the CHECK constraint backs that up at the schema level.
    pub async fn apply_delta_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        sku: &str,
        delta: i64,
        restock: bool,
    ) -> AppResult<Option<AppliedDelta>> {
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            UPDATE inventory_snapshots
            SET qty_available = qty_available + $2,
                last_restocked_at = CASE WHEN $3 THEN NOW() ELSE last_restocked_at END,
                updated_at = NOW()
            WHERE sku = $1 AND qty_available + $2 >= 0
            RETURNING qty_available
            "#,
        )
        .bind(sku)
        .bind(delta)
        .bind(restock)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(|(qty_after,)| AppliedDelta {
            sku: sku.to_string(),
            qty_change: delta,
            qty_before: qty_after - delta,
            qty_after,
        }))
    }

    /// Append one audit entry inside an existing transaction.
    pub async fn append_audit_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        applied: &AppliedDelta,
        change_type: InventoryChangeType,
        reference_id: Option<&str>,
        reason: &str,
        changed_by: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_audit_log (
                sku, change_type, qty_change, qty_before, qty_after,
                reference_id, reason, changed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&applied.sku)
        .bind(change_type)
        .bind(applied.qty_change)
        .bind(applied.qty_before)
        .bind(applied.qty_after)
        .bind(reference_id)
        .bind(reason)
        .bind(changed_by)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Audit log entries, optionally filtered to one SKU, newest first.
    pub async fn list_audit_log(
        &self,
        sku: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<InventoryAuditLogEntry>> {
        let entries = sqlx::query_as::<_, InventoryAuditLogEntry>(
            r#"
            SELECT id, sku, change_type, qty_change, qty_before, qty_after,
                   reference_id, reason, changed_by, created_at
            FROM inventory_audit_log
            WHERE ($1::text IS NULL OR sku = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(sku)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}
