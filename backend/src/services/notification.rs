//! Notification service: in-app notification rows written by the
//! notification worker and surfaced to the admin UI.

use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Notification, NotificationKind, ReorderRecommendation};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    kind: NotificationKind,
    sku: Option<String>,
    title: String,
    message: String,
    payload: Json<serde_json::Value>,
    created_at: chrono::DateTime<chrono::Utc>,
    read_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            kind: row.kind,
            sku: row.sku,
            title: row.title,
            message: row.message,
            payload: row.payload.0,
            created_at: row.created_at,
            read_at: row.read_at,
        }
    }
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a low-stock alert for a SKU whose forecast produced a positive
    /// reorder signal.
    pub async fn record_low_stock(
        &self,
        sku: &str,
        recommendation: &ReorderRecommendation,
    ) -> AppResult<Notification> {
        let payload = serde_json::to_value(recommendation)
            .map_err(|e| AppError::Internal(format!("failed to serialize recommendation: {}", e)))?;

        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (kind, sku, title, message, payload)
            VALUES ('low_stock', $1, $2, $3, $4)
            RETURNING id, kind, sku, title, message, payload, created_at, read_at
            "#,
        )
        .bind(sku)
        .bind(format!("Low stock: {}", sku))
        .bind(&recommendation.reasoning)
        .bind(Json(payload))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Recent notifications, newest first.
    pub async fn list(&self, unread_only: bool, limit: i64) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, kind, sku, title, message, payload, created_at, read_at
            FROM notifications
            WHERE (NOT $1 OR read_at IS NULL)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// Mark one notification read.
    pub async fn mark_read(&self, id: Uuid) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1
            RETURNING id, kind, sku, title, message, payload, created_at, read_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification {}", id)))?;

        Ok(row.into())
    }
}
