//! LLM-backed demand predictor
//!
//! Serializes up to 90 days of history into a structured prompt and parses
//! the JSON-constrained completion into the predictor contract. Every
//! failure mode (transport, timeout, malformed JSON, wrong shape) surfaces
//! as `PredictionUnavailable` so the composition root can fall back to the
//! heuristic; 429s pass through as `RateLimited`.

use async_trait::async_trait;
use chrono::Duration;

use shared::models::{DraftOrderPayload, ForecastPayload};

use crate::error::{AppError, AppResult};
use crate::external::LlmClient;
use crate::services::predictor::{DemandPredictor, DraftOrderInput, PredictionInput};

const MODEL_VERSION: &str = "llm-v1";

const FORECAST_SYSTEM_PROMPT: &str = "You are a demand-forecasting assistant for an \
e-commerce retailer. Respond with a single JSON object and nothing else.";

const DRAFT_SYSTEM_PROMPT: &str = "You are a procurement assistant drafting purchase \
orders for an e-commerce retailer. Respond with a single JSON object and nothing else.";

pub struct LlmPredictor {
    client: LlmClient,
}

impl LlmPredictor {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    fn forecast_prompt(input: &PredictionInput) -> String {
        let mut history_lines = String::new();
        for day in input.history.iter().rev().take(90).rev() {
            history_lines.push_str(&format!("{},{}\n", day.date, day.units));
        }

        let end = input.as_of + Duration::days(input.horizon.days() as i64 - 1);
        format!(
            "Forecast daily demand for SKU {sku} from {start} to {end} ({days} days).\n\
             Current stock: {stock}. Safety stock: {safety}. Reorder point: {reorder}.\n\
             Category: {category}. Brand: {brand}. Unit price: {price}.\n\
             Daily sales history as date,units (oldest first):\n{history}\n\
             Return JSON with exactly these fields:\n\
             {{\"predictions\": [{{\"date\": \"YYYY-MM-DD\", \"predicted_qty\": number, \
             \"confidence_lower\": number, \"confidence_upper\": number}}, ... one entry per day],\n\
             \"summary\": {{\"total_predicted\": number, \"daily_average\": number, \
             \"trend\": \"increasing\"|\"stable\"|\"decreasing\", \"seasonality_detected\": boolean}},\n\
             \"explanation\": string,\n\
             \"reorder_recommendation\": {{\"should_reorder\": boolean, \"suggested_qty\": integer, \
             \"reasoning\": string}}}}",
            sku = input.sku,
            start = input.as_of,
            end = end,
            days = input.horizon.days(),
            stock = input.current_stock,
            safety = input.safety_stock,
            reorder = input.reorder_point,
            category = input.category.as_deref().unwrap_or("unknown"),
            brand = input.brand.as_deref().unwrap_or("unknown"),
            price = input
                .unit_price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "unknown".to_string()),
            history = history_lines,
        )
    }

    fn draft_prompt(input: &DraftOrderInput) -> String {
        let mut item_lines = String::new();
        for item in &input.items {
            item_lines.push_str(&format!(
                "- sku {}, name \"{}\", stock {}, safety stock {}, reorder point {}, \
                 30-day forecast {}, unit price {:.2}, MOQ {}\n",
                item.sku,
                item.product_name,
                item.current_stock,
                item.safety_stock,
                item.reorder_point,
                item.forecast_30d_total
                    .map(|t| format!("{:.0}", t))
                    .unwrap_or_else(|| "none".to_string()),
                item.unit_price,
                item.moq,
            ));
        }

        format!(
            "Draft a purchase order for supplier \"{supplier}\" (lead time {lead} days).\n\
             {reason}Items under consideration:\n{items}\
             Recommend order quantities (respect each MOQ, skip items whose stock already \
             covers demand) and write a short professional email to the supplier.\n\
             Return JSON with exactly these fields:\n\
             {{\"lines\": [{{\"sku\": string, \"quantity\": integer}}],\n\
             \"reasoning\": string, \"email_subject\": string, \"email_body\": string}}",
            supplier = input.supplier_name,
            lead = input.supplier_lead_time_days,
            reason = input
                .reason
                .as_deref()
                .map(|r| format!("Context: {}\n", r))
                .unwrap_or_default(),
            items = item_lines,
        )
    }

    fn parse_forecast(content: &str, input: &PredictionInput) -> AppResult<ForecastPayload> {
        let json = LlmClient::extract_json(content);
        let mut payload: ForecastPayload = serde_json::from_str(json).map_err(|e| {
            AppError::PredictionUnavailable(format!("malformed forecast JSON: {}", e))
        })?;

        let expected = input.horizon.days() as usize;
        if payload.predictions.len() != expected {
            return Err(AppError::PredictionUnavailable(format!(
                "expected {} daily predictions, got {}",
                expected,
                payload.predictions.len()
            )));
        }
        for day in &mut payload.predictions {
            if !day.predicted_qty.is_finite() {
                return Err(AppError::PredictionUnavailable(
                    "non-finite predicted quantity".to_string(),
                ));
            }
            day.predicted_qty = day.predicted_qty.max(0.0);
        }
        Ok(payload)
    }

    fn parse_draft(content: &str) -> AppResult<DraftOrderPayload> {
        let json = LlmClient::extract_json(content);
        let payload: DraftOrderPayload = serde_json::from_str(json).map_err(|e| {
            AppError::PredictionUnavailable(format!("malformed draft JSON: {}", e))
        })?;
        if payload.lines.iter().any(|l| l.quantity <= 0) {
            return Err(AppError::PredictionUnavailable(
                "draft contained a non-positive quantity".to_string(),
            ));
        }
        Ok(payload)
    }
}

#[async_trait]
impl DemandPredictor for LlmPredictor {
    async fn predict(&self, input: &PredictionInput) -> AppResult<ForecastPayload> {
        let prompt = Self::forecast_prompt(input);
        let content = self
            .client
            .complete_json(FORECAST_SYSTEM_PROMPT, &prompt)
            .await?;
        Self::parse_forecast(&content, input)
    }

    async fn draft_order(&self, input: &DraftOrderInput) -> AppResult<DraftOrderPayload> {
        let prompt = Self::draft_prompt(input);
        let content = self.client.complete_json(DRAFT_SYSTEM_PROMPT, &prompt).await?;
        Self::parse_draft(&content)
    }

    fn model_version(&self) -> &str {
        MODEL_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::Horizon;

    fn input() -> PredictionInput {
        PredictionInput {
            sku: "SKU-9".to_string(),
            history: vec![],
            horizon: Horizon::Short,
            as_of: "2024-01-01".parse().unwrap(),
            current_stock: 40,
            safety_stock: 10,
            reorder_point: 15,
            category: None,
            brand: None,
            unit_price: None,
        }
    }

    fn forecast_json(days: usize) -> String {
        let predictions: Vec<String> = (0..days)
            .map(|i| {
                format!(
                    r#"{{"date":"2024-01-{:02}","predicted_qty":2.0,"confidence_lower":1.5,"confidence_upper":2.5}}"#,
                    i + 1
                )
            })
            .collect();
        format!(
            r#"{{"predictions":[{}],"summary":{{"total_predicted":60.0,"daily_average":2.0,"trend":"stable","seasonality_detected":false}},"explanation":"flat demand","reorder_recommendation":{{"should_reorder":false,"suggested_qty":0,"reasoning":"covered"}}}}"#,
            predictions.join(",")
        )
    }

    #[test]
    fn parses_contract_shaped_response() {
        let payload = LlmPredictor::parse_forecast(&forecast_json(30), &input()).unwrap();
        assert_eq!(payload.predictions.len(), 30);
        assert_eq!(payload.explanation, "flat demand");
    }

    #[test]
    fn parses_fenced_response() {
        let fenced = format!("```json\n{}\n```", forecast_json(30));
        assert!(LlmPredictor::parse_forecast(&fenced, &input()).is_ok());
    }

    #[test]
    fn rejects_wrong_day_count() {
        let err = LlmPredictor::parse_forecast(&forecast_json(7), &input()).unwrap_err();
        assert!(matches!(err, AppError::PredictionUnavailable(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = LlmPredictor::parse_forecast("not json at all", &input()).unwrap_err();
        assert!(matches!(err, AppError::PredictionUnavailable(_)));
    }

    #[test]
    fn negative_quantities_are_clamped() {
        let mut json = forecast_json(30);
        json = json.replacen("\"predicted_qty\":2.0", "\"predicted_qty\":-4.0", 1);
        let payload = LlmPredictor::parse_forecast(&json, &input()).unwrap();
        assert_eq!(payload.predictions[0].predicted_qty, 0.0);
    }

    #[test]
    fn draft_rejects_non_positive_lines() {
        let json = r#"{"lines":[{"sku":"A","quantity":0}],"reasoning":"r","email_subject":"s","email_body":"b"}"#;
        assert!(LlmPredictor::parse_draft(json).is_err());

        let ok = r#"{"lines":[{"sku":"A","quantity":5}],"reasoning":"r","email_subject":"s","email_body":"b"}"#;
        assert_eq!(LlmPredictor::parse_draft(ok).unwrap().lines[0].quantity, 5);
    }

    #[test]
    fn prompt_includes_history_and_bounds() {
        let mut i = input();
        i.history = vec![shared::models::DailySales {
            date: "2023-12-20".parse().unwrap(),
            units: 7,
        }];
        let prompt = LlmPredictor::forecast_prompt(&i);
        assert!(prompt.contains("SKU-9"));
        assert!(prompt.contains("2023-12-20,7"));
        assert!(prompt.contains("30 days"));
    }
}
