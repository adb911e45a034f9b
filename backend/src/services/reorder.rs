//! Reorder advisor: low-stock recommendations straight from inventory
//! snapshots. No forecast dependency, so it keeps working when the forecast
//! engine is degraded.

use serde::Serialize;
use sqlx::PgPool;

use shared::models::InventorySnapshot;
use shared::types::UrgencyLevel;

use crate::error::AppResult;

/// Stock at or below this is urgent regardless of the reorder point.
const HIGH_URGENCY_STOCK: i64 = 5;

/// Fallback reorder point for snapshots without a configured one.
const DEFAULT_REORDER_POINT: i64 = 15;

/// A low-stock recommendation for one SKU.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowStockRecommendation {
    pub sku: String,
    pub current_stock: i64,
    pub urgency: UrgencyLevel,
    pub recommended_qty: i64,
    pub estimated_days_until_stockout: i64,
}

/// Classify one snapshot; None when stock is above the reorder point.
pub fn classify_snapshot(snapshot: &InventorySnapshot) -> Option<LowStockRecommendation> {
    if !snapshot.is_active {
        return None;
    }
    let stock = snapshot.qty_available;
    let reorder_point = if snapshot.reorder_point > 0 {
        snapshot.reorder_point
    } else {
        DEFAULT_REORDER_POINT
    };

    if stock <= HIGH_URGENCY_STOCK {
        Some(LowStockRecommendation {
            sku: snapshot.sku.clone(),
            current_stock: stock,
            urgency: UrgencyLevel::High,
            recommended_qty: reorder_point.max(30),
            estimated_days_until_stockout: (stock / 2).max(1),
        })
    } else if stock <= reorder_point {
        Some(LowStockRecommendation {
            sku: snapshot.sku.clone(),
            current_stock: stock,
            urgency: UrgencyLevel::Medium,
            recommended_qty: reorder_point.max(20),
            estimated_days_until_stockout: (stock / 3).max(5),
        })
    } else {
        None
    }
}

/// Pure advisor over a snapshot list: high urgency first, then ascending by
/// current stock.
pub fn advise(snapshots: &[InventorySnapshot]) -> Vec<LowStockRecommendation> {
    let mut recommendations: Vec<_> = snapshots.iter().filter_map(classify_snapshot).collect();
    recommendations.sort_by(|a, b| {
        a.urgency
            .cmp(&b.urgency)
            .then(a.current_stock.cmp(&b.current_stock))
    });
    recommendations
}

/// Service wrapper fetching active snapshots for the advisor
#[derive(Clone)]
pub struct ReorderService {
    db: PgPool,
}

impl ReorderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Low-stock recommendations across all active SKUs.
    pub async fn low_stock_recommendations(&self) -> AppResult<Vec<LowStockRecommendation>> {
        let snapshots = sqlx::query_as::<_, InventorySnapshot>(
            r#"
            SELECT sku, product_name, qty_available, safety_stock, reorder_point, lead_time_days,
                   last_restocked_at, category, brand, list_price, is_active, updated_at
            FROM inventory_snapshots
            WHERE is_active = true
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(advise(&snapshots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(sku: &str, stock: i64, reorder_point: i64) -> InventorySnapshot {
        InventorySnapshot {
            sku: sku.to_string(),
            product_name: None,
            qty_available: stock,
            safety_stock: 5,
            reorder_point,
            lead_time_days: 7,
            last_restocked_at: None,
            category: None,
            brand: None,
            list_price: None,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn high_urgency_at_five_or_below() {
        let rec = classify_snapshot(&snapshot("A", 5, 15)).unwrap();
        assert_eq!(rec.urgency, UrgencyLevel::High);
        assert_eq!(rec.recommended_qty, 30);
        assert_eq!(rec.estimated_days_until_stockout, 2);

        // Stock of 1: floor(1/2) = 0 is lifted to the 1-day minimum.
        let rec = classify_snapshot(&snapshot("A", 1, 15)).unwrap();
        assert_eq!(rec.estimated_days_until_stockout, 1);
    }

    #[test]
    fn high_urgency_respects_large_reorder_points() {
        let rec = classify_snapshot(&snapshot("A", 2, 80)).unwrap();
        assert_eq!(rec.urgency, UrgencyLevel::High);
        assert_eq!(rec.recommended_qty, 80);
    }

    #[test]
    fn medium_urgency_up_to_reorder_point() {
        let rec = classify_snapshot(&snapshot("B", 12, 15)).unwrap();
        assert_eq!(rec.urgency, UrgencyLevel::Medium);
        assert_eq!(rec.recommended_qty, 20);
        assert_eq!(rec.estimated_days_until_stockout, 5);

        let rec = classify_snapshot(&snapshot("B", 15, 15)).unwrap();
        assert_eq!(rec.urgency, UrgencyLevel::Medium);
    }

    #[test]
    fn healthy_stock_gets_no_recommendation() {
        assert!(classify_snapshot(&snapshot("C", 16, 15)).is_none());
        assert!(classify_snapshot(&snapshot("C", 500, 15)).is_none());
    }

    #[test]
    fn inactive_skus_are_skipped() {
        let mut snap = snapshot("D", 2, 15);
        snap.is_active = false;
        assert!(classify_snapshot(&snap).is_none());
    }

    #[test]
    fn zero_reorder_point_falls_back_to_default() {
        let rec = classify_snapshot(&snapshot("E", 10, 0)).unwrap();
        assert_eq!(rec.urgency, UrgencyLevel::Medium);
        assert_eq!(rec.recommended_qty, 20);
    }

    #[test]
    fn sorted_high_first_then_ascending_stock() {
        let recs = advise(&[
            snapshot("medium-12", 12, 15),
            snapshot("high-4", 4, 15),
            snapshot("healthy", 100, 15),
            snapshot("high-1", 1, 15),
            snapshot("medium-8", 8, 15),
        ]);
        let order: Vec<_> = recs.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(order, vec!["high-1", "high-4", "medium-8", "medium-12"]);
    }
}
