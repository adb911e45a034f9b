//! Demand predictor tests
//!
//! Covers:
//! - Heuristic determinism under a fixed seed
//! - Risk threshold classification at the boundary edges
//! - Confidence bounds
//! - Fallback composition between predictors

use proptest::prelude::*;
use std::sync::Arc;

use drp_backend::services::heuristic::{classify_risk, confidence_score, HeuristicPredictor};
use drp_backend::services::predictor::{DemandPredictor, PredictionInput};
use shared::models::DailySales;
use shared::types::{Horizon, RiskLevel};

fn history(days: i64, units: i64) -> Vec<DailySales> {
    let base: chrono::NaiveDate = "2024-03-01".parse().unwrap();
    (0..days)
        .map(|i| DailySales {
            date: base + chrono::Duration::days(i),
            units,
        })
        .collect()
}

fn input(horizon: Horizon, stock: i64) -> PredictionInput {
    PredictionInput {
        sku: "SKU-100".to_string(),
        history: history(60, 4),
        horizon,
        as_of: "2024-06-01".parse().unwrap(),
        current_stock: stock,
        safety_stock: 12,
        reorder_point: 20,
        category: Some("apparel".to_string()),
        brand: Some("Northline".to_string()),
        unit_price: Some(35.0),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Same seed, same input: byte-identical forecasts across repeated calls
    /// and across predictor instances.
    #[tokio::test]
    async fn heuristic_is_deterministic_under_fixed_seed() {
        let first = HeuristicPredictor::with_seed(99);
        let second = HeuristicPredictor::with_seed(99);
        let i = input(Horizon::Medium, 80);

        let a = first.predict(&i).await.unwrap();
        let b = first.predict(&i).await.unwrap();
        let c = second.predict(&i).await.unwrap();

        assert_eq!(a.predictions, b.predictions);
        assert_eq!(a.predictions, c.predictions);
        assert_eq!(a.summary, c.summary);
        assert_eq!(a.explanation, c.explanation);
    }

    /// Risk classification for the 30-day horizon at the sample ratios.
    #[test]
    fn risk_levels_for_30_day_horizon() {
        let demand = 100.0;
        assert_eq!(classify_risk(20, demand, Horizon::Short), RiskLevel::Critical);
        assert_eq!(classify_risk(50, demand, Horizon::Short), RiskLevel::High);
        assert_eq!(classify_risk(90, demand, Horizon::Short), RiskLevel::Medium);
        assert_eq!(classify_risk(150, demand, Horizon::Short), RiskLevel::Low);
    }

    /// Each threshold edge flips the classification.
    #[test]
    fn risk_threshold_edges() {
        let demand = 1000.0;
        for (stock, expected) in [
            (299, RiskLevel::Critical),
            (300, RiskLevel::High),
            (599, RiskLevel::High),
            (600, RiskLevel::Medium),
            (999, RiskLevel::Medium),
            (1000, RiskLevel::Low),
        ] {
            assert_eq!(classify_risk(stock, demand, Horizon::Short), expected, "stock {}", stock);
        }
    }

    /// The fallback decorator hands the same input to the heuristic when the
    /// primary fails, so the composed predictor still satisfies the
    /// contract.
    #[tokio::test]
    async fn fallback_composition_produces_contract_payload() {
        struct AlwaysFails;

        #[async_trait::async_trait]
        impl DemandPredictor for AlwaysFails {
            async fn predict(
                &self,
                _input: &PredictionInput,
            ) -> drp_backend::error::AppResult<shared::models::ForecastPayload> {
                Err(drp_backend::error::AppError::PredictionUnavailable(
                    "provider outage".to_string(),
                ))
            }

            async fn draft_order(
                &self,
                _input: &drp_backend::services::predictor::DraftOrderInput,
            ) -> drp_backend::error::AppResult<shared::models::DraftOrderPayload> {
                Err(drp_backend::error::AppError::PredictionUnavailable(
                    "provider outage".to_string(),
                ))
            }

            fn model_version(&self) -> &str {
                "outage-v0"
            }
        }

        let composed = drp_backend::services::FallbackPredictor::new(
            Arc::new(AlwaysFails),
            Arc::new(HeuristicPredictor::with_seed(1)),
        );

        let i = input(Horizon::Short, 40);
        let payload = composed.predict(&i).await.unwrap();
        assert_eq!(payload.predictions.len(), 30);
        assert!(payload
            .predictions
            .iter()
            .all(|p| p.confidence_lower <= p.predicted_qty && p.predicted_qty <= p.confidence_upper));
    }

    /// Confidence is additive but hard-capped.
    #[test]
    fn confidence_is_bounded() {
        assert!(confidence_score(1.0, Some(500.0), i64::MAX / 2, 1) <= 0.95);
        assert!(confidence_score(0.0, None, 0, 100) >= 0.35);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn horizon_strategy() -> impl Strategy<Value = Horizon> {
        prop_oneof![
            Just(Horizon::Short),
            Just(Horizon::Medium),
            Just(Horizon::Long),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// One prediction per day of the horizon, every quantity
        /// non-negative and inside its own confidence band.
        #[test]
        fn payload_shape_holds_for_any_stock_and_seed(
            seed in any::<u64>(),
            stock in 0i64..100_000,
            horizon in horizon_strategy()
        ) {
            let predictor = HeuristicPredictor::with_seed(seed);
            let payload =
                tokio_test::block_on(predictor.predict(&input(horizon, stock))).unwrap();

            prop_assert_eq!(payload.predictions.len(), horizon.days() as usize);
            for p in &payload.predictions {
                prop_assert!(p.predicted_qty >= 0.0);
                prop_assert!(p.confidence_lower <= p.predicted_qty);
                prop_assert!(p.predicted_qty <= p.confidence_upper);
            }
        }

        /// Determinism holds for arbitrary seeds, not just hand-picked ones.
        #[test]
        fn determinism_for_any_seed(
            seed in any::<u64>(),
            stock in 0i64..10_000,
            horizon in horizon_strategy()
        ) {
            let predictor = HeuristicPredictor::with_seed(seed);
            let i = input(horizon, stock);
            let a = tokio_test::block_on(predictor.predict(&i)).unwrap();
            let b = tokio_test::block_on(predictor.predict(&i)).unwrap();
            prop_assert_eq!(a.predictions, b.predictions);
        }

        /// Risk never improves as stock shrinks against fixed demand.
        #[test]
        fn risk_is_monotonic_in_stock(
            demand in 1.0f64..10_000.0,
            horizon in horizon_strategy(),
            stock_a in 0i64..20_000,
            stock_b in 0i64..20_000
        ) {
            let (lo, hi) = if stock_a <= stock_b { (stock_a, stock_b) } else { (stock_b, stock_a) };
            let rank = |r: RiskLevel| match r {
                RiskLevel::Critical => 0,
                RiskLevel::High => 1,
                RiskLevel::Medium => 2,
                RiskLevel::Low => 3,
            };
            prop_assert!(rank(classify_risk(lo, demand, horizon)) <= rank(classify_risk(hi, demand, horizon)));
        }

        /// A positive reorder signal always carries a positive quantity.
        #[test]
        fn reorder_signal_quantity_consistency(
            seed in any::<u64>(),
            stock in 0i64..5_000
        ) {
            let predictor = HeuristicPredictor::with_seed(seed);
            let payload =
                tokio_test::block_on(predictor.predict(&input(Horizon::Short, stock))).unwrap();
            let rec = payload.reorder_recommendation;
            if rec.should_reorder {
                prop_assert!(rec.suggested_qty > 0);
            } else {
                prop_assert_eq!(rec.suggested_qty, 0);
            }
        }
    }
}
