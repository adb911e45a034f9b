//! Error handling for the Demand Replenishment Platform
//!
//! Every engine-level failure is distinguishable by kind, for logging and
//! alerting as well as for callers of the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Forecast engine errors
    #[error("No historical sales data for SKU {0}")]
    NoHistoricalData(String),

    #[error("No inventory record for SKU {0}")]
    NoInventoryRecord(String),

    // Predictor errors
    #[error("Prediction unavailable: {0}")]
    PredictionUnavailable(String),

    #[error("Predictor rate limited: {0}")]
    RateLimited(String),

    // PO engine errors
    #[error("Cannot {action} a purchase order in status '{status}'")]
    InvalidTransition { action: String, status: String },

    #[error("Supplier not found: {0}")]
    SupplierNotFound(Uuid),

    #[error("Receipt of {po_number} failed and was rolled back: {reason}")]
    ReceiptFailure { po_number: String, reason: String },

    // Job infrastructure errors
    #[error("Failed to dispatch job: {0}")]
    QueueDispatchFailure(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NoHistoricalData(_) => "NO_HISTORICAL_DATA",
            AppError::NoInventoryRecord(_) => "NO_INVENTORY_RECORD",
            AppError::PredictionUnavailable(_) => "PREDICTION_UNAVAILABLE",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::SupplierNotFound(_) => "SUPPLIER_NOT_FOUND",
            AppError::ReceiptFailure { .. } => "RECEIPT_FAILED",
            AppError::QueueDispatchFailure(_) => "QUEUE_DISPATCH_FAILED",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NoHistoricalData(_) | AppError::NoInventoryRecord(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::PredictionUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SupplierNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ReceiptFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::QueueDispatchFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let field = match &self {
            AppError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };

        // Database internals are logged, not echoed to callers.
        let message = match &self {
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            other => other.to_string(),
        };

        tracing::error!(code = self.code(), error = ?self, "request failed");

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                field,
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_are_distinguishable() {
        let errors = [
            AppError::NoHistoricalData("SKU-1".into()),
            AppError::NoInventoryRecord("SKU-1".into()),
            AppError::PredictionUnavailable("timeout".into()),
            AppError::RateLimited("slow down".into()),
            AppError::InvalidTransition {
                action: "send".into(),
                status: "draft".into(),
            },
            AppError::QueueDispatchFailure("queue closed".into()),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn invalid_transition_names_state_and_action() {
        let err = AppError::InvalidTransition {
            action: "receive".into(),
            status: "draft".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("receive"));
        assert!(msg.contains("draft"));
    }
}
