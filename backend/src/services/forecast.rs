//! Forecast engine: cache lookup, history retrieval, predictor invocation,
//! persistence and derived summaries.

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use shared::models::{
    ComputedSummary, DailySales, Forecast, ForecastAccuracy, ForecastPayload, ForecastSummary,
    InventorySnapshot, ReorderRecommendation,
};
use shared::types::{ConfidenceBucket, Horizon};
use shared::validation::validate_sku;

use crate::error::{AppError, AppResult};
use crate::services::predictor::{DemandPredictor, PredictionInput};

/// How long a stored forecast stays fresh.
const FRESHNESS_HOURS: i64 = 24;

/// How much sales history the predictors consume.
const HISTORY_DAYS: i64 = 90;

/// Forecast service orchestrating the demand predictors
#[derive(Clone)]
pub struct ForecastService {
    db: PgPool,
    predictor: Arc<dyn DemandPredictor>,
}

/// Database row for a stored forecast
#[derive(Debug, FromRow)]
struct ForecastRow {
    id: Uuid,
    sku: String,
    horizon_days: i32,
    generated_at: chrono::DateTime<Utc>,
    predictions: Json<Vec<shared::models::DailyPrediction>>,
    summary: Json<ForecastSummary>,
    explanation: String,
    model_version: String,
    reorder_recommendation: Json<ReorderRecommendation>,
}

impl From<ForecastRow> for Forecast {
    fn from(row: ForecastRow) -> Self {
        Forecast {
            id: row.id,
            sku: row.sku,
            horizon_days: row.horizon_days,
            generated_at: row.generated_at,
            predictions: row.predictions.0,
            summary: row.summary.0,
            explanation: row.explanation,
            model_version: row.model_version,
            reorder_recommendation: row.reorder_recommendation.0,
        }
    }
}

/// A stored forecast together with summary fields recomputed from its
/// predictions array on read.
#[derive(Debug, Serialize)]
pub struct LatestForecast {
    #[serde(flatten)]
    pub forecast: Forecast,
    pub computed_summary: ComputedSummary,
}

/// Per-SKU outcome of a batch generation run.
#[derive(Debug, Serialize)]
pub struct BatchForecastResult {
    pub sku: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Mean absolute percentage error over (predicted, actual) day pairs.
///
/// Days with zero actual sales are skipped (percentage error is undefined
/// there); returns None when no comparable day remains.
pub fn mape(pairs: &[(f64, f64)]) -> Option<f64> {
    let comparable: Vec<_> = pairs.iter().filter(|(_, actual)| *actual > 0.0).collect();
    if comparable.is_empty() {
        return None;
    }
    let sum: f64 = comparable
        .iter()
        .map(|(predicted, actual)| ((actual - predicted) / actual).abs() * 100.0)
        .sum();
    Some(sum / comparable.len() as f64)
}

impl ForecastService {
    pub fn new(db: PgPool, predictor: Arc<dyn DemandPredictor>) -> Self {
        Self { db, predictor }
    }

    /// Generate (or reuse) a forecast for one SKU and horizon.
    ///
    /// Without `force_refresh`, a stored forecast generated within the last
    /// 24 hours is returned unchanged, so at most one computation runs per
    /// SKU+horizon per window. Freshness check and persistence are not
    /// atomic across the engine: two concurrent forced calls may both
    /// compute and both persist. Forecasts are append-only, so that yields
    /// extra history rather than corruption.
    pub async fn generate_forecast(
        &self,
        sku: &str,
        horizon: Horizon,
        force_refresh: bool,
    ) -> AppResult<Forecast> {
        validate_sku(sku).map_err(|message| AppError::Validation {
            field: "sku".to_string(),
            message: message.to_string(),
        })?;

        if !force_refresh {
            if let Some(fresh) = self.fresh_forecast(sku, horizon).await? {
                tracing::debug!(sku, horizon = %horizon, forecast_id = %fresh.id, "forecast cache hit");
                return Ok(fresh);
            }
        }

        let history = self.fetch_sales_history(sku).await?;
        if history.is_empty() {
            return Err(AppError::NoHistoricalData(sku.to_string()));
        }
        let snapshot = self.fetch_snapshot(sku).await?;

        let input = PredictionInput::from_snapshot(
            &snapshot,
            history,
            horizon,
            Utc::now().date_naive(),
        );
        let payload = self.predictor.predict(&input).await?;

        let forecast = self
            .persist_forecast(sku, horizon, payload, self.predictor.model_version())
            .await?;
        tracing::info!(sku, horizon = %horizon, forecast_id = %forecast.id, "forecast generated");
        Ok(forecast)
    }

    /// Latest stored forecast with its summary recomputed from the
    /// predictions array rather than the summary persisted at generation
    /// time.
    pub async fn get_latest_forecast(
        &self,
        sku: &str,
        horizon: Horizon,
    ) -> AppResult<LatestForecast> {
        let forecast = self
            .latest_forecast(sku, horizon)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Forecast for {}", sku)))?;

        let computed_summary = ComputedSummary::from_predictions(&forecast.predictions);
        Ok(LatestForecast {
            forecast,
            computed_summary,
        })
    }

    /// All stored forecasts for a SKU, newest first.
    pub async fn list_forecasts(
        &self,
        sku: &str,
        horizon: Option<Horizon>,
    ) -> AppResult<Vec<Forecast>> {
        let rows = sqlx::query_as::<_, ForecastRow>(
            r#"
            SELECT id, sku, horizon_days, generated_at, predictions, summary,
                   explanation, model_version, reorder_recommendation
            FROM forecasts
            WHERE sku = $1 AND ($2::int IS NULL OR horizon_days = $2)
            ORDER BY generated_at DESC
            "#,
        )
        .bind(sku)
        .bind(horizon.map(|h| h.days()))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Forecast::from).collect())
    }

    /// Score one forecast against realized sales (MAPE).
    pub async fn calculate_accuracy(&self, forecast_id: Uuid) -> AppResult<ForecastAccuracy> {
        let forecast: Forecast = sqlx::query_as::<_, ForecastRow>(
            r#"
            SELECT id, sku, horizon_days, generated_at, predictions, summary,
                   explanation, model_version, reorder_recommendation
            FROM forecasts
            WHERE id = $1
            "#,
        )
        .bind(forecast_id)
        .fetch_optional(&self.db)
        .await?
        .map(Forecast::from)
        .ok_or_else(|| AppError::NotFound(format!("Forecast {}", forecast_id)))?;

        let actuals = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT sold_at::date AS date, COALESCE(SUM(quantity), 0)::bigint AS units
            FROM sales_records
            WHERE sku = $1 AND sold_at::date >= $2 AND sold_at::date <= $3
            GROUP BY sold_at::date
            "#,
        )
        .bind(&forecast.sku)
        .bind(
            forecast
                .predictions
                .iter()
                .map(|p| p.date)
                .min()
                .unwrap_or_else(|| Utc::now().date_naive()),
        )
        .bind(
            forecast
                .predictions
                .iter()
                .map(|p| p.date)
                .max()
                .unwrap_or_else(|| Utc::now().date_naive()),
        )
        .fetch_all(&self.db)
        .await?;

        let actual_by_date: std::collections::HashMap<_, _> =
            actuals.iter().map(|d| (d.date, d.units as f64)).collect();

        let pairs: Vec<(f64, f64)> = forecast
            .predictions
            .iter()
            .filter_map(|p| {
                actual_by_date
                    .get(&p.date)
                    .map(|actual| (p.predicted_qty, *actual))
            })
            .collect();

        let days_compared = pairs.iter().filter(|(_, a)| *a > 0.0).count();
        let mape_value = mape(&pairs);

        Ok(ForecastAccuracy {
            forecast_id,
            sku: forecast.sku,
            horizon_days: forecast.horizon_days,
            days_compared,
            mape: mape_value,
            confidence: mape_value.map(ConfidenceBucket::from_mape),
        })
    }

    /// Generate forecasts for many SKUs with per-SKU failure isolation: one
    /// SKU's failure is captured in its result entry and never aborts the
    /// rest of the batch.
    pub async fn batch_generate(
        &self,
        skus: &[String],
        horizon: Horizon,
    ) -> Vec<BatchForecastResult> {
        let mut results = Vec::with_capacity(skus.len());
        for sku in skus {
            match self.generate_forecast(sku, horizon, false).await {
                Ok(forecast) => results.push(BatchForecastResult {
                    sku: sku.clone(),
                    success: true,
                    forecast_id: Some(forecast.id),
                    error: None,
                }),
                Err(err) => {
                    tracing::warn!(sku, error = %err, "batch forecast item failed");
                    results.push(BatchForecastResult {
                        sku: sku.clone(),
                        success: false,
                        forecast_id: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        results
    }

    async fn fresh_forecast(&self, sku: &str, horizon: Horizon) -> AppResult<Option<Forecast>> {
        let cutoff = Utc::now() - Duration::hours(FRESHNESS_HOURS);
        Ok(self
            .latest_forecast(sku, horizon)
            .await?
            .filter(|f| f.generated_at > cutoff))
    }

    async fn latest_forecast(&self, sku: &str, horizon: Horizon) -> AppResult<Option<Forecast>> {
        let row = sqlx::query_as::<_, ForecastRow>(
            r#"
            SELECT id, sku, horizon_days, generated_at, predictions, summary,
                   explanation, model_version, reorder_recommendation
            FROM forecasts
            WHERE sku = $1 AND horizon_days = $2
            ORDER BY generated_at DESC
            LIMIT 1
            "#,
        )
        .bind(sku)
        .bind(horizon.days())
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Forecast::from))
    }

    /// Daily-bucketed sales for the trailing history window, oldest first.
    async fn fetch_sales_history(&self, sku: &str) -> AppResult<Vec<DailySales>> {
        let since = Utc::now() - Duration::days(HISTORY_DAYS);
        let rows = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT sold_at::date AS date, COALESCE(SUM(quantity), 0)::bigint AS units
            FROM sales_records
            WHERE sku = $1 AND sold_at >= $2
            GROUP BY sold_at::date
            ORDER BY sold_at::date ASC
            "#,
        )
        .bind(sku)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn fetch_snapshot(&self, sku: &str) -> AppResult<InventorySnapshot> {
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

    /// Append a new forecast row; existing rows are never overwritten.
    async fn persist_forecast(
        &self,
        sku: &str,
        horizon: Horizon,
        payload: ForecastPayload,
        model_version: &str,
    ) -> AppResult<Forecast> {
        let row = sqlx::query_as::<_, ForecastRow>(
            r#"
            INSERT INTO forecasts (
                sku, horizon_days, generated_at, predictions, summary,
                explanation, model_version, reorder_recommendation
            )
            VALUES ($1, $2, NOW(), $3, $4, $5, $6, $7)
            RETURNING id, sku, horizon_days, generated_at, predictions, summary,
                      explanation, model_version, reorder_recommendation
            "#,
        )
        .bind(sku)
        .bind(horizon.days())
        .bind(Json(&payload.predictions))
        .bind(Json(&payload.summary))
        .bind(&payload.explanation)
        .bind(model_version)
        .bind(Json(&payload.reorder_recommendation))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}
