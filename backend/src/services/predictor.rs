//! Demand predictor capability interface
//!
//! One interface, two implementations: the LLM-backed predictor and the
//! deterministic heuristic. The composition root in `main` decides which to
//! wire up; the explicit fallback decorator lives here rather than being
//! hidden inside either implementation.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;

use shared::models::{DailySales, ForecastPayload, InventorySnapshot};
use shared::types::Horizon;

use crate::error::{AppError, AppResult};

/// Everything a predictor needs to forecast demand for one SKU.
#[derive(Debug, Clone)]
pub struct PredictionInput {
    pub sku: String,
    /// Daily-bucketed sales, oldest first, at most 90 days.
    pub history: Vec<DailySales>,
    pub horizon: Horizon,
    /// First day of the forecast window. Passed in rather than read from the
    /// clock so predictor output is a pure function of its input.
    pub as_of: chrono::NaiveDate,
    pub current_stock: i64,
    pub safety_stock: i64,
    pub reorder_point: i64,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub unit_price: Option<f64>,
}

impl PredictionInput {
    pub fn from_snapshot(
        snapshot: &InventorySnapshot,
        history: Vec<DailySales>,
        horizon: Horizon,
        as_of: chrono::NaiveDate,
    ) -> Self {
        Self {
            sku: snapshot.sku.clone(),
            history,
            horizon,
            as_of,
            current_stock: snapshot.qty_available,
            safety_stock: snapshot.safety_stock,
            reorder_point: snapshot.reorder_point,
            category: snapshot.category.clone(),
            brand: snapshot.brand.clone(),
            unit_price: snapshot.list_price.as_ref().and_then(|p| p.to_f64()),
        }
    }
}

/// One SKU's context for the PO drafting step.
#[derive(Debug, Clone)]
pub struct DraftOrderItem {
    pub sku: String,
    pub product_name: String,
    pub current_stock: i64,
    pub safety_stock: i64,
    pub reorder_point: i64,
    /// Total predicted 30-day demand, when a forecast exists.
    pub forecast_30d_total: Option<f64>,
    pub unit_price: f64,
    pub moq: i64,
}

/// Input to the predictor-driven PO drafting step.
#[derive(Debug, Clone)]
pub struct DraftOrderInput {
    pub supplier_name: String,
    pub supplier_lead_time_days: i32,
    pub items: Vec<DraftOrderItem>,
    pub reason: Option<String>,
}

/// The polymorphic demand-prediction capability.
///
/// Both operations share the same duality: the LLM implementation asks the
/// external service, the heuristic computes locally, and callers compose
/// them through [`FallbackPredictor`].
#[async_trait]
pub trait DemandPredictor: Send + Sync {
    /// Forecast daily demand over the input's horizon.
    async fn predict(&self, input: &PredictionInput) -> AppResult<ForecastPayload>;

    /// Produce recommended order quantities and a supplier-facing message.
    async fn draft_order(
        &self,
        input: &DraftOrderInput,
    ) -> AppResult<shared::models::DraftOrderPayload>;

    /// Version tag stamped onto persisted forecasts.
    fn model_version(&self) -> &str;
}

/// Explicit fallback composition: try the primary once, then the fallback.
///
/// `RateLimited` from the primary still falls back (the heuristic is local
/// and free); only a failure of both surfaces to the caller.
pub struct FallbackPredictor {
    primary: Arc<dyn DemandPredictor>,
    fallback: Arc<dyn DemandPredictor>,
}

impl FallbackPredictor {
    pub fn new(primary: Arc<dyn DemandPredictor>, fallback: Arc<dyn DemandPredictor>) -> Self {
        Self { primary, fallback }
    }

    fn log_and_pick_fallback(&self, operation: &str, err: &AppError) -> bool {
        match err {
            AppError::PredictionUnavailable(reason) => {
                tracing::warn!(%reason, operation, "primary predictor failed, falling back");
                true
            }
            AppError::RateLimited(reason) => {
                tracing::warn!(%reason, operation, "primary predictor rate limited, falling back");
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl DemandPredictor for FallbackPredictor {
    async fn predict(&self, input: &PredictionInput) -> AppResult<ForecastPayload> {
        match self.primary.predict(input).await {
            Ok(payload) => Ok(payload),
            Err(err) if self.log_and_pick_fallback("predict", &err) => {
                self.fallback.predict(input).await.map_err(|fallback_err| {
                    AppError::PredictionUnavailable(format!(
                        "primary failed ({}); fallback failed ({})",
                        err, fallback_err
                    ))
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn draft_order(
        &self,
        input: &DraftOrderInput,
    ) -> AppResult<shared::models::DraftOrderPayload> {
        match self.primary.draft_order(input).await {
            Ok(payload) => Ok(payload),
            Err(err) if self.log_and_pick_fallback("draft_order", &err) => {
                self.fallback
                    .draft_order(input)
                    .await
                    .map_err(|fallback_err| {
                        AppError::PredictionUnavailable(format!(
                            "primary failed ({}); fallback failed ({})",
                            err, fallback_err
                        ))
                    })
            }
            Err(err) => Err(err),
        }
    }

    fn model_version(&self) -> &str {
        self.primary.model_version()
    }
}
