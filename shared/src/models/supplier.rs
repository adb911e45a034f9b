//! Supplier and supplier price models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A supplier that purchase orders can be raised against.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub lead_time_days: i32,
    pub payment_terms: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Price offered by a supplier for one SKU.
///
/// A price is "current" iff `valid_until` is null or has not passed. Writes
/// go through update-else-insert so at most one current price exists per
/// (supplier, sku).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SupplierPrice {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub sku: String,
    pub unit_price: Decimal,
    pub moq: i64,
    pub valid_until: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SupplierPrice {
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        match self.valid_until {
            None => true,
            Some(until) => until >= now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn price(valid_until: Option<DateTime<Utc>>) -> SupplierPrice {
        SupplierPrice {
            id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            sku: "SKU-1".to_string(),
            unit_price: Decimal::new(1250, 2),
            moq: 10,
            valid_until,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn null_valid_until_is_always_current() {
        assert!(price(None).is_current(Utc::now()));
    }

    #[test]
    fn expiry_boundary() {
        let now = Utc::now();
        assert!(price(Some(now)).is_current(now));
        assert!(price(Some(now + Duration::hours(1))).is_current(now));
        assert!(!price(Some(now - Duration::hours(1))).is_current(now));
    }
}
