//! Purchase order engine: draft generation, the approval/sending/receipt
//! state machine, and inventory reconciliation on receipt.

use chrono::{Datelike, Duration, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use shared::models::{
    ForecastSummary, InventoryChangeType, PoAction, PoLineItem, PoStatus, PurchaseOrder, Supplier,
    SupplierPrice,
};
use shared::validation::validate_sku_batch;

use crate::error::{AppError, AppResult};
use crate::services::inventory::InventoryService;
use crate::services::predictor::{DemandPredictor, DraftOrderInput, DraftOrderItem};

/// Attempts at claiming a PO number before giving up. Collisions only occur
/// when two drafts race for the same sequence.
const PO_NUMBER_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
    predictor: Arc<dyn DemandPredictor>,
}

/// Database row for a purchase order
#[derive(Debug, FromRow)]
struct PurchaseOrderRow {
    id: Uuid,
    po_number: String,
    supplier_id: Uuid,
    status: PoStatus,
    line_items: Json<Vec<PoLineItem>>,
    total_amount: Decimal,
    expected_delivery_date: Option<chrono::NaiveDate>,
    ai_reasoning: Option<String>,
    draft_email_subject: Option<String>,
    draft_email_body: Option<String>,
    approved_by: Option<String>,
    approved_at: Option<chrono::DateTime<Utc>>,
    sent_at: Option<chrono::DateTime<Utc>>,
    received_at: Option<chrono::DateTime<Utc>>,
    notes: Option<String>,
    created_by: String,
    created_at: chrono::DateTime<Utc>,
}

impl From<PurchaseOrderRow> for PurchaseOrder {
    fn from(row: PurchaseOrderRow) -> Self {
        PurchaseOrder {
            id: row.id,
            po_number: row.po_number,
            supplier_id: row.supplier_id,
            status: row.status,
            line_items: row.line_items.0,
            total_amount: row.total_amount,
            expected_delivery_date: row.expected_delivery_date,
            ai_reasoning: row.ai_reasoning,
            draft_email_subject: row.draft_email_subject,
            draft_email_body: row.draft_email_body,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            sent_at: row.sent_at,
            received_at: row.received_at,
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Fields editable while a PO is still a draft.
#[derive(Debug, Deserialize)]
pub struct UpdatePoInput {
    pub line_items: Option<Vec<PoLineItem>>,
    pub expected_delivery_date: Option<chrono::NaiveDate>,
    pub notes: Option<String>,
}

const SELECT_PO: &str = r#"
    SELECT id, po_number, supplier_id, status, line_items, total_amount,
           expected_delivery_date, ai_reasoning, draft_email_subject,
           draft_email_body, approved_by, approved_at, sent_at, received_at,
           notes, created_by, created_at
    FROM purchase_orders
"#;

/// Format a PO number: `PO-<4-digit-year>-<4-digit-sequence>`.
pub fn format_po_number(year: i32, sequence: u32) -> String {
    format!("PO-{}-{:04}", year, sequence)
}

/// Extract the sequence from a PO number of the given year; None when the
/// number does not match the `PO-<year>-<seq>` shape.
pub fn parse_po_sequence(po_number: &str, year: i32) -> Option<u32> {
    po_number
        .strip_prefix(&format!("PO-{}-", year))?
        .parse()
        .ok()
}

impl PurchaseOrderService {
    pub fn new(db: PgPool, predictor: Arc<dyn DemandPredictor>) -> Self {
        Self { db, predictor }
    }

    /// Build a draft PO for the given SKUs against one supplier.
    ///
    /// Loads supplier, current prices, inventory and the latest 30-day
    /// forecast totals, asks the predictor's drafting step for quantities
    /// and the supplier-facing message, and persists the result as `draft`
    /// under the next sequential PO number for the calendar year.
    pub async fn generate_draft(
        &self,
        skus: &[String],
        supplier_id: Uuid,
        reason: Option<String>,
        created_by: &str,
    ) -> AppResult<PurchaseOrder> {
        validate_sku_batch(skus).map_err(|message| AppError::Validation {
            field: "skus".to_string(),
            message: message.to_string(),
        })?;

        let supplier = self.fetch_supplier(supplier_id).await?;
        let prices = self.fetch_current_prices(supplier_id, skus).await?;

        let missing: Vec<&str> = skus
            .iter()
            .filter(|sku| !prices.iter().any(|p| &p.sku == *sku))
            .map(|s| s.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation {
                field: "skus".to_string(),
                message: format!(
                    "no current price from {} for: {}",
                    supplier.name,
                    missing.join(", ")
                ),
            });
        }

        let mut items = Vec::with_capacity(skus.len());
        for price in &prices {
            let snapshot = InventoryService::new(self.db.clone())
                .get_snapshot(&price.sku)
                .await?;
            let forecast_total = self.latest_30d_forecast_total(&price.sku).await?;
            items.push(DraftOrderItem {
                sku: price.sku.clone(),
                product_name: snapshot
                    .product_name
                    .clone()
                    .unwrap_or_else(|| price.sku.clone()),
                current_stock: snapshot.qty_available,
                safety_stock: snapshot.safety_stock,
                reorder_point: snapshot.reorder_point,
                forecast_30d_total: forecast_total,
                unit_price: price.unit_price.to_f64().unwrap_or(0.0),
                moq: price.moq,
            });
        }

        let draft = self
            .predictor
            .draft_order(&DraftOrderInput {
                supplier_name: supplier.name.clone(),
                supplier_lead_time_days: supplier.lead_time_days,
                items: items.clone(),
                reason,
            })
            .await?;

        if draft.lines.is_empty() {
            return Err(AppError::Validation {
                field: "skus".to_string(),
                message: "current stock already covers projected demand for every SKU".to_string(),
            });
        }

        let mut line_items = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let Some(item) = items.iter().find(|i| i.sku == line.sku) else {
                // Drafting step returned a SKU nobody asked for; drop it.
                tracing::warn!(sku = %line.sku, "drafting step invented a SKU, skipping");
                continue;
            };
            let unit_price = prices
                .iter()
                .find(|p| p.sku == line.sku)
                .map(|p| p.unit_price)
                .unwrap_or(Decimal::ZERO);
            let qty_decimal = Decimal::from_i64(line.quantity).unwrap_or(Decimal::ZERO);
            line_items.push(PoLineItem {
                sku: line.sku.clone(),
                product_name: item.product_name.clone(),
                qty: line.quantity,
                unit_price,
                total_price: unit_price * qty_decimal,
            });
        }

        let total_amount: Decimal = line_items.iter().map(|l| l.total_price).sum();
        let expected_delivery =
            Utc::now().date_naive() + Duration::days(supplier.lead_time_days as i64);

        let po = self
            .insert_draft(
                supplier_id,
                &line_items,
                total_amount,
                expected_delivery,
                &draft.reasoning,
                &draft.email_subject,
                &draft.email_body,
                created_by,
            )
            .await?;

        tracing::info!(po_number = %po.po_number, supplier = %supplier.name, "draft PO created");
        Ok(po)
    }

    /// Approve a draft (or pending-approval) PO.
    pub async fn approve(&self, id: Uuid, approved_by: &str) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET status = 'approved', approved_by = $2, approved_at = NOW()
            WHERE id = $1 AND status IN ('draft', 'pending_approval')
            RETURNING {}
            "#,
            PO_COLUMNS
        ))
        .bind(id)
        .bind(approved_by)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.invalid_transition(id, PoAction::Approve).await?),
        }
    }

    /// Mark an approved PO as sent to the supplier.
    pub async fn send(&self, id: Uuid) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET status = 'sent', sent_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING {}
            "#,
            PO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.invalid_transition(id, PoAction::Send).await?),
        }
    }

    /// Receive a sent PO: increment inventory for every line item, append
    /// one audit entry per line with real before/after quantities, then mark
    /// the PO received. The whole group commits or rolls back together; a
    /// partial increment is never observable. Re-receiving is rejected by
    /// the status guard, so redelivered jobs cannot double-increment.
    pub async fn receive(&self, id: Uuid, received_by: &str) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            "{} WHERE id = $1 FOR UPDATE",
            SELECT_PO
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Purchase order {}", id)))?;

        if !row.status.allows(PoAction::Receive) {
            return Err(AppError::InvalidTransition {
                action: PoAction::Receive.as_str().to_string(),
                status: row.status.as_str().to_string(),
            });
        }

        let po_number = row.po_number.clone();
        for line in row.line_items.0.iter() {
            let applied =
                InventoryService::apply_delta_in_tx(&mut tx, &line.sku, line.qty, true)
                    .await
                    .map_err(|e| AppError::ReceiptFailure {
                        po_number: po_number.clone(),
                        reason: e.to_string(),
                    })?
                    .ok_or_else(|| AppError::ReceiptFailure {
                        po_number: po_number.clone(),
                        reason: format!("no inventory snapshot for SKU {}", line.sku),
                    })?;

            InventoryService::append_audit_in_tx(
                &mut tx,
                &applied,
                InventoryChangeType::PoReceipt,
                Some(&po_number),
                &format!("Receipt of {}", po_number),
                received_by,
            )
            .await
            .map_err(|e| AppError::ReceiptFailure {
                po_number: po_number.clone(),
                reason: e.to_string(),
            })?;
        }

        let updated = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET status = 'received', received_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PO_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await.map_err(|e| AppError::ReceiptFailure {
            po_number: po_number.clone(),
            reason: format!("commit failed: {}", e),
        })?;

        tracing::info!(po_number = %po_number, received_by, "PO received, inventory reconciled");
        Ok(updated.into())
    }

    /// Edit a PO while it is still a draft.
    pub async fn update(&self, id: Uuid, input: UpdatePoInput) -> AppResult<PurchaseOrder> {
        let total: Option<Decimal> = input
            .line_items
            .as_ref()
            .map(|items| items.iter().map(|l| l.total_price).sum());

        let row = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET line_items = COALESCE($2, line_items),
                total_amount = COALESCE($3, total_amount),
                expected_delivery_date = COALESCE($4, expected_delivery_date),
                notes = COALESCE($5, notes)
            WHERE id = $1 AND status = 'draft'
            RETURNING {}
            "#,
            PO_COLUMNS
        ))
        .bind(id)
        .bind(input.line_items.map(Json))
        .bind(total)
        .bind(input.expected_delivery_date)
        .bind(input.notes)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.invalid_transition(id, PoAction::Update).await?),
        }
    }

    /// Cancel a PO. Disallowed once received.
    pub async fn cancel(&self, id: Uuid) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET status = 'cancelled'
            WHERE id = $1 AND status <> 'received'
            RETURNING {}
            "#,
            PO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.invalid_transition(id, PoAction::Cancel).await?),
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, PurchaseOrderRow>(&format!("{} WHERE id = $1", SELECT_PO))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Purchase order {}", id)))?;
        Ok(row.into())
    }

    /// List POs, optionally filtered by status, newest first.
    pub async fn list(&self, status: Option<PoStatus>) -> AppResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            "{} WHERE ($1::po_status IS NULL OR status = $1) ORDER BY created_at DESC",
            SELECT_PO
        ))
        .bind(status)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PurchaseOrder::from).collect())
    }

    /// Build the invalid-transition error for a guard that rejected, naming
    /// the actual current state.
    async fn invalid_transition(&self, id: Uuid, action: PoAction) -> AppResult<AppError> {
        let po = self.get(id).await?;
        Ok(AppError::InvalidTransition {
            action: action.as_str().to_string(),
            status: po.status.as_str().to_string(),
        })
    }

    async fn fetch_supplier(&self, supplier_id: Uuid) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, email, lead_time_days, payment_terms, is_active,
                   created_at, updated_at
            FROM suppliers
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::SupplierNotFound(supplier_id))
    }

    async fn fetch_current_prices(
        &self,
        supplier_id: Uuid,
        skus: &[String],
    ) -> AppResult<Vec<SupplierPrice>> {
        let prices = sqlx::query_as::<_, SupplierPrice>(
            r#"
            SELECT id, supplier_id, sku, unit_price, moq, valid_until, updated_at
            FROM supplier_prices
            WHERE supplier_id = $1
              AND sku = ANY($2)
              AND (valid_until IS NULL OR valid_until >= NOW())
            "#,
        )
        .bind(supplier_id)
        .bind(skus)
        .fetch_all(&self.db)
        .await?;

        Ok(prices)
    }

    async fn latest_30d_forecast_total(&self, sku: &str) -> AppResult<Option<f64>> {
        let summary = sqlx::query_as::<_, (Json<ForecastSummary>,)>(
            r#"
            SELECT summary
            FROM forecasts
            WHERE sku = $1 AND horizon_days = 30
            ORDER BY generated_at DESC
            LIMIT 1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.db)
        .await?;

        Ok(summary.map(|(s,)| s.0.total_predicted))
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_draft(
        &self,
        supplier_id: Uuid,
        line_items: &[PoLineItem],
        total_amount: Decimal,
        expected_delivery: chrono::NaiveDate,
        reasoning: &str,
        email_subject: &str,
        email_body: &str,
        created_by: &str,
    ) -> AppResult<PurchaseOrder> {
        let year = Utc::now().year();

        // The unique index on po_number arbitrates concurrent drafts; on a
        // collision the loop re-reads the max sequence and tries again.
        for attempt in 0..PO_NUMBER_ATTEMPTS {
            let po_number = format_po_number(year, self.next_sequence(year).await?);

            let result = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
                r#"
                INSERT INTO purchase_orders (
                    po_number, supplier_id, status, line_items, total_amount,
                    expected_delivery_date, ai_reasoning, draft_email_subject,
                    draft_email_body, created_by
                )
                VALUES ($1, $2, 'draft', $3, $4, $5, $6, $7, $8, $9)
                RETURNING {}
                "#,
                PO_COLUMNS
            ))
            .bind(&po_number)
            .bind(supplier_id)
            .bind(Json(line_items))
            .bind(total_amount)
            .bind(expected_delivery)
            .bind(reasoning)
            .bind(email_subject)
            .bind(email_body)
            .bind(created_by)
            .fetch_one(&self.db)
            .await;

            match result {
                Ok(row) => return Ok(row.into()),
                Err(sqlx::Error::Database(db_err))
                    if db_err.code().as_deref() == Some("23505")
                        && attempt + 1 < PO_NUMBER_ATTEMPTS =>
                {
                    tracing::debug!(po_number, "PO number collision, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal(
            "could not allocate a purchase order number".to_string(),
        ))
    }

    /// Next free sequence for the year, from the highest existing number
    /// under that year's prefix.
    async fn next_sequence(&self, year: i32) -> AppResult<u32> {
        let latest: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT po_number
            FROM purchase_orders
            WHERE po_number LIKE $1
            ORDER BY po_number DESC
            LIMIT 1
            "#,
        )
        .bind(format!("PO-{}-%", year))
        .fetch_optional(&self.db)
        .await?;

        Ok(latest
            .and_then(|(po_number,)| parse_po_sequence(&po_number, year))
            .map(|seq| seq + 1)
            .unwrap_or(1))
    }
}

/// Column list shared by every RETURNING clause.
const PO_COLUMNS: &str = "id, po_number, supplier_id, status, line_items, total_amount, \
     expected_delivery_date, ai_reasoning, draft_email_subject, draft_email_body, \
     approved_by, approved_at, sent_at, received_at, notes, created_by, created_at";
