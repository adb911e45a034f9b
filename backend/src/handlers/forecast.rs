//! HTTP handlers for forecast generation and accuracy endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{Forecast, ForecastAccuracy};
use shared::types::Horizon;

use crate::error::{AppError, AppResult};
use crate::services::forecast::{BatchForecastResult, ForecastService, LatestForecast};
use crate::AppState;

fn parse_horizon(days: i32) -> AppResult<Horizon> {
    Horizon::try_from(days).map_err(|message| AppError::Validation {
        field: "horizon_days".to_string(),
        message,
    })
}

/// Request to generate a forecast
#[derive(Debug, Deserialize)]
pub struct GenerateForecastRequest {
    pub sku: String,
    pub horizon_days: i32,
    #[serde(default)]
    pub force_refresh: bool,
}

/// Request to generate forecasts for a batch of SKUs
#[derive(Debug, Deserialize)]
pub struct BatchForecastRequest {
    pub skus: Vec<String>,
    pub horizon_days: i32,
}

/// Horizon selection for read endpoints; defaults to the 30-day window.
#[derive(Debug, Deserialize)]
pub struct HorizonQuery {
    pub horizon_days: Option<i32>,
}

/// Generate (or return the fresh cached) forecast for one SKU
pub async fn generate_forecast(
    State(state): State<AppState>,
    Json(request): Json<GenerateForecastRequest>,
) -> AppResult<Json<Forecast>> {
    let horizon = parse_horizon(request.horizon_days)?;
    let service = ForecastService::new(state.db, state.predictor);
    let forecast = service
        .generate_forecast(&request.sku, horizon, request.force_refresh)
        .await?;
    Ok(Json(forecast))
}

/// Generate forecasts for many SKUs with per-SKU failure isolation
pub async fn batch_generate_forecasts(
    State(state): State<AppState>,
    Json(request): Json<BatchForecastRequest>,
) -> AppResult<Json<Vec<BatchForecastResult>>> {
    let horizon = parse_horizon(request.horizon_days)?;
    let service = ForecastService::new(state.db, state.predictor);
    let results = service.batch_generate(&request.skus, horizon).await;
    Ok(Json(results))
}

/// Latest forecast for a SKU with recomputed summary fields
pub async fn get_latest_forecast(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Query(query): Query<HorizonQuery>,
) -> AppResult<Json<LatestForecast>> {
    let horizon = parse_horizon(query.horizon_days.unwrap_or(30))?;
    let service = ForecastService::new(state.db, state.predictor);
    let latest = service.get_latest_forecast(&sku, horizon).await?;
    Ok(Json(latest))
}

/// Stored forecast history for a SKU
pub async fn list_forecasts(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Query(query): Query<HorizonQuery>,
) -> AppResult<Json<Vec<Forecast>>> {
    let horizon = query.horizon_days.map(parse_horizon).transpose()?;
    let service = ForecastService::new(state.db, state.predictor);
    let forecasts = service.list_forecasts(&sku, horizon).await?;
    Ok(Json(forecasts))
}

/// MAPE accuracy of one stored forecast against realized sales
pub async fn get_forecast_accuracy(
    State(state): State<AppState>,
    Path(forecast_id): Path<Uuid>,
) -> AppResult<Json<ForecastAccuracy>> {
    let service = ForecastService::new(state.db, state.predictor);
    let accuracy = service.calculate_accuracy(forecast_id).await?;
    Ok(Json(accuracy))
}
