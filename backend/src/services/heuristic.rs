//! Deterministic heuristic demand predictor
//!
//! Demand is a horizon-scaled base rate (a fraction of current stock) shaped
//! by five multiplicative factors: category/season, brand strength, price
//! elasticity, festival-calendar impact, and bounded random variation. The
//! random variation comes from an RNG seeded per call from the base seed and
//! the input, so identical inputs always produce identical output.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use shared::models::{
    DailyPrediction, DraftOrderPayload, DraftOrderLine, ForecastPayload, ForecastSummary,
    ReorderRecommendation, Trend,
};
use shared::types::{Horizon, RiskLevel};

use crate::error::AppResult;
use crate::services::predictor::{
    DemandPredictor, DraftOrderInput, DraftOrderItem, PredictionInput,
};

const MODEL_VERSION: &str = "heuristic-v1";

/// Fraction of current stock forming the base demand estimate, by horizon.
fn base_rate(horizon: Horizon) -> f64 {
    match horizon {
        Horizon::Short => 0.15,
        Horizon::Medium => 0.25,
        Horizon::Long => 0.35,
    }
}

/// Minimum base demand in units, by horizon.
fn base_floor(horizon: Horizon) -> f64 {
    match horizon {
        Horizon::Short => 2.0,
        Horizon::Medium => 3.0,
        Horizon::Long => 5.0,
    }
}

/// Month -> festival/holiday demand impact. Peaks across the festival
/// quarter (October-December), trough in the post-holiday lull.
const FESTIVAL_IMPACT: [f64; 12] = [
    0.85, // Jan
    0.90, // Feb
    0.95, // Mar
    1.00, // Apr
    0.95, // May
    0.90, // Jun
    0.95, // Jul
    1.05, // Aug
    1.10, // Sep
    1.30, // Oct
    1.45, // Nov
    1.25, // Dec
];

/// How strongly the festival calendar weighs on each horizon.
fn seasonal_weight(horizon: Horizon) -> f64 {
    match horizon {
        Horizon::Short => 0.4,
        Horizon::Medium => 0.7,
        Horizon::Long => 1.0,
    }
}

/// Bounded random variation by horizon.
fn noise_spread(horizon: Horizon) -> f64 {
    match horizon {
        Horizon::Short => 0.10,
        Horizon::Medium => 0.20,
        Horizon::Long => 0.30,
    }
}

/// Price bands for the elasticity factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceBand {
    Budget,
    Value,
    Mid,
    Premium,
}

fn price_band(unit_price: Option<f64>) -> Option<PriceBand> {
    let price = unit_price?;
    Some(if price < 20.0 {
        PriceBand::Budget
    } else if price < 60.0 {
        PriceBand::Value
    } else if price < 150.0 {
        PriceBand::Mid
    } else {
        PriceBand::Premium
    })
}

/// Price-elasticity multiplier. Direction flips between horizons: cheap
/// items move faster short-term, premium items dominate the long window.
fn price_multiplier(unit_price: Option<f64>, horizon: Horizon) -> f64 {
    let Some(band) = price_band(unit_price) else {
        return 1.0;
    };
    match horizon {
        Horizon::Short => match band {
            PriceBand::Budget => 1.20,
            PriceBand::Value => 1.10,
            PriceBand::Mid => 1.00,
            PriceBand::Premium => 0.85,
        },
        Horizon::Medium => match band {
            PriceBand::Budget => 1.05,
            PriceBand::Value => 1.05,
            PriceBand::Mid => 1.05,
            PriceBand::Premium => 1.00,
        },
        Horizon::Long => match band {
            PriceBand::Budget => 0.90,
            PriceBand::Value => 1.00,
            PriceBand::Mid => 1.10,
            PriceBand::Premium => 1.25,
        },
    }
}

/// Brand strength, proxied from catalog presence and recent sales velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrandStrength {
    Strong,
    Moderate,
    Unknown,
}

fn brand_strength(brand: Option<&str>, avg_daily_sales: f64) -> BrandStrength {
    match brand {
        Some(_) if avg_daily_sales >= 5.0 => BrandStrength::Strong,
        Some(_) if avg_daily_sales >= 1.0 => BrandStrength::Moderate,
        Some(_) => BrandStrength::Unknown,
        None => BrandStrength::Unknown,
    }
}

fn brand_score(strength: BrandStrength) -> f64 {
    match strength {
        BrandStrength::Strong => 1.0,
        BrandStrength::Moderate => 0.6,
        BrandStrength::Unknown => 0.3,
    }
}

/// Brand-strength multiplier, tiered by horizon: reputation compounds over
/// longer windows.
fn brand_multiplier(strength: BrandStrength, horizon: Horizon) -> f64 {
    match horizon {
        Horizon::Short => match strength {
            BrandStrength::Strong => 1.15,
            BrandStrength::Moderate => 1.05,
            BrandStrength::Unknown => 0.95,
        },
        Horizon::Medium => match strength {
            BrandStrength::Strong => 1.20,
            BrandStrength::Moderate => 1.05,
            BrandStrength::Unknown => 0.90,
        },
        Horizon::Long => match strength {
            BrandStrength::Strong => 1.30,
            BrandStrength::Moderate => 1.10,
            BrandStrength::Unknown => 0.85,
        },
    }
}

/// Category/season multiplier over the months the horizon covers.
fn category_multiplier(category: Option<&str>, horizon: Horizon, start_month: u32) -> f64 {
    let Some(category) = category else {
        return 1.0;
    };
    let winter_window = (10..=12).contains(&start_month) || start_month <= 2;
    let summer_window = (5..=8).contains(&start_month);

    match category.to_ascii_lowercase().as_str() {
        "apparel" | "fashion" => {
            // Wardrobe turnover concentrates around season changes.
            let seasonal = if winter_window || summer_window { 1.15 } else { 1.0 };
            match horizon {
                Horizon::Short => seasonal,
                Horizon::Medium => seasonal * 1.05,
                Horizon::Long => seasonal * 1.10,
            }
        }
        "electronics" => match horizon {
            Horizon::Short => 1.05,
            Horizon::Medium => 1.10,
            Horizon::Long => {
                if winter_window {
                    1.25
                } else {
                    1.10
                }
            }
        },
        "beauty" | "personal-care" => 1.05,
        "grocery" | "essentials" => match horizon {
            Horizon::Short => 1.10,
            _ => 1.0,
        },
        "home" | "furniture" => match horizon {
            Horizon::Short => 0.95,
            Horizon::Medium => 1.0,
            Horizon::Long => 1.05,
        },
        _ => 1.0,
    }
}

/// Festival multiplier over the calendar months the window spans, blended
/// toward 1.0 by the horizon's seasonal weight.
fn festival_multiplier(as_of: NaiveDate, horizon: Horizon) -> (f64, bool) {
    let months = months_covered(as_of, horizon);
    let avg: f64 =
        months.iter().map(|m| FESTIVAL_IMPACT[(*m - 1) as usize]).sum::<f64>() / months.len() as f64;
    let detected = months
        .iter()
        .any(|m| FESTIVAL_IMPACT[(*m - 1) as usize] >= 1.2);
    (1.0 + (avg - 1.0) * seasonal_weight(horizon), detected)
}

fn months_covered(as_of: NaiveDate, horizon: Horizon) -> Vec<u32> {
    let mut months = Vec::new();
    let mut day = as_of;
    let end = as_of + Duration::days(horizon.days() as i64);
    while day < end {
        if !months.contains(&day.month()) {
            months.push(day.month());
        }
        // Jumping by whole months is enough; per-day resolution adds nothing.
        day = day + Duration::days(28);
    }
    if months.is_empty() {
        months.push(as_of.month());
    }
    months
}

/// Stockout risk from the stock-to-demand cover ratio. Shorter horizons use
/// tighter thresholds: the same ratio means fewer days of cover at 30 days
/// than at 90.
pub fn classify_risk(current_stock: i64, predicted_demand: f64, horizon: Horizon) -> RiskLevel {
    let ratio = current_stock as f64 / predicted_demand.max(1.0);
    let (critical, high, medium) = match horizon {
        Horizon::Short => (0.3, 0.6, 1.0),
        Horizon::Medium => (0.25, 0.5, 0.85),
        Horizon::Long => (0.2, 0.4, 0.7),
    };
    if ratio < critical {
        RiskLevel::Critical
    } else if ratio < high {
        RiskLevel::High
    } else if ratio < medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Per-item confidence: bounded additive blend of brand reputation, price
/// tier and stock depth, capped at 0.95.
pub fn confidence_score(
    brand: f64,
    unit_price: Option<f64>,
    current_stock: i64,
    safety_stock: i64,
) -> f64 {
    let price_bonus = match price_band(unit_price) {
        Some(PriceBand::Budget) => 0.02,
        Some(PriceBand::Value) => 0.05,
        Some(PriceBand::Mid) => 0.08,
        Some(PriceBand::Premium) => 0.10,
        None => 0.0,
    };
    let depth = safety_stock.max(1) as f64 * 10.0;
    let stock_bonus = (current_stock as f64 / depth).clamp(0.0, 0.10);
    (0.55 + 0.20 * brand + price_bonus + stock_bonus).clamp(0.35, 0.95)
}

fn detect_trend(history: &[shared::models::DailySales]) -> Trend {
    if history.len() < 14 {
        return Trend::Stable;
    }
    let mid = history.len() / 2;
    let first: f64 = history[..mid].iter().map(|d| d.units as f64).sum::<f64>() / mid as f64;
    let second: f64 = history[mid..].iter().map(|d| d.units as f64).sum::<f64>()
        / (history.len() - mid) as f64;
    if first <= 0.0 {
        return if second > 0.0 { Trend::Increasing } else { Trend::Stable };
    }
    let change = second / first;
    if change > 1.1 {
        Trend::Increasing
    } else if change < 0.9 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// The deterministic predictor. Pure: no I/O, and the per-call RNG is
/// derived from `seed` plus the input, so repeated calls with the same input
/// are identical.
pub struct HeuristicPredictor {
    seed: u64,
}

impl HeuristicPredictor {
    pub fn new() -> Self {
        Self {
            seed: rand::random(),
        }
    }

    /// Fixed seed for reproducible output, used by tests and batch replays.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, input: &PredictionInput) -> StdRng {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        input.sku.hash(&mut hasher);
        input.horizon.days().hash(&mut hasher);
        input.as_of.hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish())
    }

    fn compute(&self, input: &PredictionInput) -> ForecastPayload {
        let horizon = input.horizon;
        let days = horizon.days() as usize;
        let mut rng = self.rng_for(input);

        let avg_daily_sales = if input.history.is_empty() {
            0.0
        } else {
            input.history.iter().map(|d| d.units as f64).sum::<f64>()
                / input.history.len() as f64
        };

        let base =
            (input.current_stock as f64 * base_rate(horizon)).max(base_floor(horizon));

        let strength = brand_strength(input.brand.as_deref(), avg_daily_sales);
        let category =
            category_multiplier(input.category.as_deref(), horizon, input.as_of.month());
        let brand = brand_multiplier(strength, horizon);
        let price = price_multiplier(input.unit_price, horizon);
        let (festival, seasonality_detected) = festival_multiplier(input.as_of, horizon);
        let spread = noise_spread(horizon);
        let noise = 1.0 + rng.gen_range(-spread..=spread);

        let total = base * category * brand * price * festival * noise;
        let daily_base = total / days as f64;

        let confidence = confidence_score(
            brand_score(strength),
            input.unit_price,
            input.current_stock,
            input.safety_stock,
        );
        let band = 1.0 - confidence;

        let mut predictions = Vec::with_capacity(days);
        for offset in 0..days {
            let date = input.as_of + Duration::days(offset as i64);
            let wiggle = 1.0 + rng.gen_range(-0.1..=0.1);
            let qty = (daily_base * wiggle).max(0.0);
            predictions.push(DailyPrediction {
                date,
                predicted_qty: round2(qty),
                confidence_lower: round2((qty * (1.0 - band)).max(0.0)),
                confidence_upper: round2(qty * (1.0 + band)),
            });
        }

        let total_predicted: f64 = predictions.iter().map(|p| p.predicted_qty).sum();
        let trend = detect_trend(&input.history);
        let risk = classify_risk(input.current_stock, total_predicted, horizon);

        let projected_closing = input.current_stock as f64 - total_predicted;
        let should_reorder = matches!(risk, RiskLevel::Critical | RiskLevel::High)
            || projected_closing < input.safety_stock as f64;
        let suggested_qty = if should_reorder {
            ((total_predicted + input.safety_stock as f64 - input.current_stock as f64).ceil()
                as i64)
                .max(1)
        } else {
            0
        };

        let explanation = format!(
            "Projected {:.0} units over {} days from a base rate of {:.0} \
             (category x{:.2}, brand x{:.2}, price x{:.2}, seasonal x{:.2}). \
             Demand trend is {:?}; stock cover is rated {} risk.",
            total_predicted,
            days,
            base,
            category,
            brand,
            price,
            festival,
            trend,
            risk.as_str(),
        );

        let reasoning = if should_reorder {
            format!(
                "{} units on hand against {:.0} projected ({} risk); reorder to restore cover above the {}-unit safety stock.",
                input.current_stock, total_predicted, risk.as_str(), input.safety_stock
            )
        } else {
            format!(
                "{} units on hand cover the projected {:.0} with {} risk; no reorder needed.",
                input.current_stock, total_predicted, risk.as_str()
            )
        };

        ForecastPayload {
            predictions,
            summary: ForecastSummary {
                total_predicted: round2(total_predicted),
                daily_average: round2(total_predicted / days as f64),
                trend,
                seasonality_detected,
            },
            explanation,
            reorder_recommendation: ReorderRecommendation {
                should_reorder,
                suggested_qty,
                reasoning,
            },
        }
    }
}

impl Default for HeuristicPredictor {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl DemandPredictor for HeuristicPredictor {
    async fn predict(&self, input: &PredictionInput) -> AppResult<ForecastPayload> {
        Ok(self.compute(input))
    }

    async fn draft_order(&self, input: &DraftOrderInput) -> AppResult<DraftOrderPayload> {
        let mut lines = Vec::new();
        let mut notes = Vec::new();

        for item in &input.items {
            let projected_demand = item
                .forecast_30d_total
                .unwrap_or_else(|| (item.reorder_point as f64 * 2.0).max(10.0));
            let need =
                projected_demand + item.safety_stock as f64 - item.current_stock as f64;
            let qty = need.ceil() as i64;
            if qty <= 0 {
                notes.push(format!("{}: stock already covers projected demand", item.sku));
                continue;
            }
            let qty = qty.max(item.moq);
            notes.push(format!(
                "{}: {} on hand, {:.0} projected over 30 days, ordering {}",
                item.sku, item.current_stock, projected_demand, qty
            ));
            lines.push(DraftOrderLine {
                sku: item.sku.clone(),
                quantity: qty,
            });
        }

        let email_body = format!(
            "Dear {},\n\nPlease find our purchase order below. Requested delivery within {} days.\n\n{}\n\nKind regards,\nDemand Planning",
            input.supplier_name,
            input.supplier_lead_time_days,
            input
                .items
                .iter()
                .filter_map(|item| {
                    lines
                        .iter()
                        .find(|l| l.sku == item.sku)
                        .map(|l| format!("- {} ({}): {} units", item.product_name, item.sku, l.quantity))
                })
                .collect::<Vec<_>>()
                .join("\n"),
        );

        Ok(DraftOrderPayload {
            lines,
            reasoning: notes.join("; "),
            email_subject: format!("Purchase Order - {}", input.supplier_name),
            email_body,
        })
    }

    fn model_version(&self) -> &str {
        MODEL_VERSION
    }
}
