//! Supplier service: supplier CRUD and the price list.
//!
//! Price writes go through update-else-insert so at most one current price
//! exists per (supplier, sku).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{Supplier, SupplierPrice};
use shared::validation::validate_sku;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// Input for creating a supplier
#[derive(Debug, Deserialize, validator::Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = 0, max = 365))]
    pub lead_time_days: i32,
    pub payment_terms: Option<String>,
}

/// Input for updating a supplier
#[derive(Debug, Deserialize)]
pub struct UpdateSupplierInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub lead_time_days: Option<i32>,
    pub payment_terms: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for upserting a supplier price
#[derive(Debug, Deserialize)]
pub struct UpsertPriceInput {
    pub sku: String,
    pub unit_price: Decimal,
    pub moq: Option<i64>,
    /// None means the price never expires.
    pub valid_until: Option<DateTime<Utc>>,
}

const SUPPLIER_COLUMNS: &str =
    "id, name, email, lead_time_days, payment_terms, is_active, created_at, updated_at";

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        validator::Validate::validate(&input).map_err(|e| AppError::Validation {
            field: "supplier".to_string(),
            message: e.to_string(),
        })?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (name, email, lead_time_days, payment_terms)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.lead_time_days)
        .bind(&input.payment_terms)
        .fetch_one(&self.db)
        .await?;

        Ok(supplier)
    }

    pub async fn update(&self, id: Uuid, input: UpdateSupplierInput) -> AppResult<Supplier> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                lead_time_days = COALESCE($4, lead_time_days),
                payment_terms = COALESCE($5, payment_terms),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.lead_time_days)
        .bind(input.payment_terms)
        .bind(input.is_active)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::SupplierNotFound(id))?;

        Ok(supplier)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers WHERE id = $1",
            SUPPLIER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::SupplierNotFound(id))
    }

    pub async fn list(&self) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers ORDER BY is_active DESC, name ASC",
            SUPPLIER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    /// Update-else-insert a price so the (supplier, sku) pair keeps at most
    /// one current price.
    pub async fn upsert_price(
        &self,
        supplier_id: Uuid,
        input: UpsertPriceInput,
    ) -> AppResult<SupplierPrice> {
        validate_sku(&input.sku).map_err(|message| AppError::Validation {
            field: "sku".to_string(),
            message: message.to_string(),
        })?;
        if input.unit_price <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price".to_string(),
                message: "Unit price must be positive".to_string(),
            });
        }

        // Ensure the supplier exists before touching prices.
        self.get(supplier_id).await?;

        let moq = input.moq.unwrap_or(1);

        let updated = sqlx::query_as::<_, SupplierPrice>(
            r#"
            UPDATE supplier_prices
            SET unit_price = $3, moq = $4, valid_until = $5, updated_at = NOW()
            WHERE supplier_id = $1 AND sku = $2
              AND (valid_until IS NULL OR valid_until >= NOW())
            RETURNING id, supplier_id, sku, unit_price, moq, valid_until, updated_at
            "#,
        )
        .bind(supplier_id)
        .bind(&input.sku)
        .bind(input.unit_price)
        .bind(moq)
        .bind(input.valid_until)
        .fetch_optional(&self.db)
        .await?;

        if let Some(price) = updated {
            return Ok(price);
        }

        let inserted = sqlx::query_as::<_, SupplierPrice>(
            r#"
            INSERT INTO supplier_prices (supplier_id, sku, unit_price, moq, valid_until)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, supplier_id, sku, unit_price, moq, valid_until, updated_at
            "#,
        )
        .bind(supplier_id)
        .bind(&input.sku)
        .bind(input.unit_price)
        .bind(moq)
        .bind(input.valid_until)
        .fetch_one(&self.db)
        .await?;

        Ok(inserted)
    }

    /// Current prices for one supplier.
    pub async fn list_prices(&self, supplier_id: Uuid) -> AppResult<Vec<SupplierPrice>> {
        let prices = sqlx::query_as::<_, SupplierPrice>(
            r#"
            SELECT id, supplier_id, sku, unit_price, moq, valid_until, updated_at
            FROM supplier_prices
            WHERE supplier_id = $1
              AND (valid_until IS NULL OR valid_until >= NOW())
            ORDER BY sku ASC
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.db)
        .await?;

        Ok(prices)
    }
}
