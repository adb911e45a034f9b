//! Sales history models
//!
//! Sales records are written by the order-fulfillment collaborator and are
//! strictly read-only inside this system.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single fulfilled sale line, append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SalesRecord {
    pub id: Uuid,
    pub sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub sold_at: DateTime<Utc>,
}

/// Sales for one SKU bucketed by calendar day, the unit the predictors
/// consume.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailySales {
    pub date: NaiveDate,
    pub units: i64,
}
