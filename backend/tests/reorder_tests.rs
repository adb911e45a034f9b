//! Reorder advisor tests
//!
//! Covers:
//! - Urgency tier classification and recommended quantities
//! - Stockout-day estimates
//! - Output ordering (high urgency first, then ascending stock)

use chrono::Utc;
use proptest::prelude::*;

use drp_backend::services::reorder::{advise, classify_snapshot};
use shared::models::InventorySnapshot;
use shared::types::UrgencyLevel;

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

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn five_units_or_fewer_is_high_urgency() {
        for stock in 0..=5 {
            let rec = classify_snapshot(&snapshot("A", stock, 15)).unwrap();
            assert_eq!(rec.urgency, UrgencyLevel::High, "stock {}", stock);
            assert_eq!(rec.recommended_qty, 30);
            assert_eq!(rec.estimated_days_until_stockout, (stock / 2).max(1));
        }
    }

    #[test]
    fn at_or_below_reorder_point_is_medium_urgency() {
        for stock in 6..=15 {
            let rec = classify_snapshot(&snapshot("B", stock, 15)).unwrap();
            assert_eq!(rec.urgency, UrgencyLevel::Medium, "stock {}", stock);
            assert_eq!(rec.recommended_qty, 20);
            assert_eq!(rec.estimated_days_until_stockout, (stock / 3).max(5));
        }
    }

    #[test]
    fn above_reorder_point_is_silent() {
        assert!(classify_snapshot(&snapshot("C", 16, 15)).is_none());
    }

    #[test]
    fn recommended_qty_tracks_large_reorder_points() {
        let rec = classify_snapshot(&snapshot("D", 3, 50)).unwrap();
        assert_eq!(rec.recommended_qty, 50);

        let rec = classify_snapshot(&snapshot("E", 40, 50)).unwrap();
        assert_eq!(rec.urgency, UrgencyLevel::Medium);
        assert_eq!(rec.recommended_qty, 50);
    }

    #[test]
    fn ordering_is_high_first_then_ascending_stock() {
        let recs = advise(&[
            snapshot("m-14", 14, 15),
            snapshot("h-3", 3, 15),
            snapshot("ok", 60, 15),
            snapshot("h-0", 0, 15),
            snapshot("m-7", 7, 15),
        ]);
        let skus: Vec<_> = recs.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["h-0", "h-3", "m-7", "m-14"]);
    }

    #[test]
    fn inactive_skus_never_surface() {
        let mut inactive = snapshot("gone", 0, 15);
        inactive.is_active = false;
        assert!(advise(&[inactive]).is_empty());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn snapshot_strategy() -> impl Strategy<Value = InventorySnapshot> {
        ("sku-[a-z]{4}", 0i64..200, 1i64..100)
            .prop_map(|(sku, stock, reorder_point)| snapshot(&sku, stock, reorder_point))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Output is always sorted: no medium entry before a high one, and
        /// within a tier stock never decreases.
        #[test]
        fn output_is_sorted(snapshots in prop::collection::vec(snapshot_strategy(), 0..30)) {
            let recs = advise(&snapshots);
            for pair in recs.windows(2) {
                prop_assert!(pair[0].urgency <= pair[1].urgency);
                if pair[0].urgency == pair[1].urgency {
                    prop_assert!(pair[0].current_stock <= pair[1].current_stock);
                }
            }
        }

        /// Every recommendation is actionable: positive quantity and a
        /// positive stockout estimate.
        #[test]
        fn recommendations_are_actionable(snapshots in prop::collection::vec(snapshot_strategy(), 0..30)) {
            for rec in advise(&snapshots) {
                prop_assert!(rec.recommended_qty >= 20);
                prop_assert!(rec.estimated_days_until_stockout >= 1);
            }
        }

        /// A SKU surfaces iff its stock is at or below max(reorder point, 5).
        #[test]
        fn classification_threshold(stock in 0i64..200, reorder_point in 1i64..100) {
            let snap = snapshot("sku-x", stock, reorder_point);
            let classified = classify_snapshot(&snap).is_some();
            prop_assert_eq!(classified, stock <= reorder_point.max(5));
        }
    }
}
