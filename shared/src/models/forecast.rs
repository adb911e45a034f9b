//! Demand forecast models and the predictor response contract
//!
//! Every predictor implementation (LLM-backed or heuristic) must produce a
//! `ForecastPayload` with exactly this shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Demand trend classification over the forecast window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

/// One predicted day of demand with its confidence band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPrediction {
    pub date: NaiveDate,
    pub predicted_qty: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
}

/// Aggregate view over the predictions array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub total_predicted: f64,
    pub daily_average: f64,
    pub trend: Trend,
    pub seasonality_detected: bool,
}

/// Reorder signal attached to a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderRecommendation {
    pub should_reorder: bool,
    pub suggested_qty: i64,
    pub reasoning: String,
}

/// The response contract both predictor implementations must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub predictions: Vec<DailyPrediction>,
    pub summary: ForecastSummary,
    pub explanation: String,
    pub reorder_recommendation: ReorderRecommendation,
}

/// A persisted forecast. Immutable once written; a SKU accumulates one row
/// per generation so accuracy can be tracked against realized sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub id: Uuid,
    pub sku: String,
    pub horizon_days: i32,
    pub generated_at: DateTime<Utc>,
    pub predictions: Vec<DailyPrediction>,
    pub summary: ForecastSummary,
    pub explanation: String,
    pub model_version: String,
    pub reorder_recommendation: ReorderRecommendation,
}

/// Summary fields recomputed from the stored predictions on read, rather
/// than trusting the summary persisted at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedSummary {
    pub total_predicted: f64,
    pub daily_average: f64,
    pub peak_day: Option<NaiveDate>,
}

impl ComputedSummary {
    /// Derive totals, daily average and peak day from a predictions array.
    pub fn from_predictions(predictions: &[DailyPrediction]) -> Self {
        let total_predicted: f64 = predictions.iter().map(|p| p.predicted_qty).sum();
        let daily_average = if predictions.is_empty() {
            0.0
        } else {
            total_predicted / predictions.len() as f64
        };
        let peak_day = predictions
            .iter()
            .max_by(|a, b| {
                a.predicted_qty
                    .partial_cmp(&b.predicted_qty)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|p| p.date);

        Self {
            total_predicted,
            daily_average,
            peak_day,
        }
    }
}

/// Accuracy of one forecast against realized sales.
///
/// `mape` is null when no predicted day had non-zero actual sales to compare
/// against (percentage error is undefined at zero actuals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    pub forecast_id: Uuid,
    pub sku: String,
    pub horizon_days: i32,
    pub days_compared: usize,
    pub mape: Option<f64>,
    pub confidence: Option<crate::types::ConfidenceBucket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(date: &str, qty: f64) -> DailyPrediction {
        DailyPrediction {
            date: date.parse().unwrap(),
            predicted_qty: qty,
            confidence_lower: qty * 0.8,
            confidence_upper: qty * 1.2,
        }
    }

    #[test]
    fn computed_summary_totals_and_peak() {
        let predictions = vec![
            pred("2024-01-01", 4.0),
            pred("2024-01-02", 10.0),
            pred("2024-01-03", 6.0),
        ];
        let summary = ComputedSummary::from_predictions(&predictions);
        assert_eq!(summary.total_predicted, 20.0);
        assert!((summary.daily_average - 20.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.peak_day, Some("2024-01-02".parse().unwrap()));
    }

    #[test]
    fn computed_summary_empty() {
        let summary = ComputedSummary::from_predictions(&[]);
        assert_eq!(summary.total_predicted, 0.0);
        assert_eq!(summary.daily_average, 0.0);
        assert_eq!(summary.peak_day, None);
    }

    #[test]
    fn payload_contract_field_names() {
        let payload = ForecastPayload {
            predictions: vec![pred("2024-01-01", 5.0)],
            summary: ForecastSummary {
                total_predicted: 5.0,
                daily_average: 5.0,
                trend: Trend::Stable,
                seasonality_detected: false,
            },
            explanation: "steady".to_string(),
            reorder_recommendation: ReorderRecommendation {
                should_reorder: false,
                suggested_qty: 0,
                reasoning: "enough cover".to_string(),
            },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["predictions"][0]["predicted_qty"].is_number());
        assert_eq!(json["summary"]["trend"], "stable");
        assert_eq!(json["reorder_recommendation"]["should_reorder"], false);
    }
}
