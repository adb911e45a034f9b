//! Purchase order models and the state machine guard
//!
//! Lifecycle: draft -> approved -> sent -> received, with cancellation
//! reachable from any state except received. The guard lives here so both
//! the service layer and tests share one source of truth.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purchase order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "po_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PoStatus {
    Draft,
    PendingApproval,
    Approved,
    Sent,
    Received,
    Cancelled,
}

impl PoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoStatus::Draft => "draft",
            PoStatus::PendingApproval => "pending_approval",
            PoStatus::Approved => "approved",
            PoStatus::Sent => "sent",
            PoStatus::Received => "received",
            PoStatus::Cancelled => "cancelled",
        }
    }
}

/// Action attempted against a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoAction {
    Approve,
    Send,
    Receive,
    Update,
    Cancel,
}

impl PoAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoAction::Approve => "approve",
            PoAction::Send => "send",
            PoAction::Receive => "receive",
            PoAction::Update => "update",
            PoAction::Cancel => "cancel",
        }
    }
}

impl PoStatus {
    /// Whether `action` is allowed from this state. Rejections never mutate
    /// anything; callers surface them as invalid-transition errors.
    pub fn allows(&self, action: PoAction) -> bool {
        match action {
            PoAction::Approve => matches!(self, PoStatus::Draft | PoStatus::PendingApproval),
            PoAction::Send => matches!(self, PoStatus::Approved),
            PoAction::Receive => matches!(self, PoStatus::Sent),
            PoAction::Update => matches!(self, PoStatus::Draft),
            PoAction::Cancel => !matches!(self, PoStatus::Received),
        }
    }
}

/// One ordered line on a purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoLineItem {
    pub sku: String,
    pub product_name: String,
    pub qty: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// A purchase order. `po_number` is unique with format `PO-<year>-<seq>`,
/// the sequence restarting each calendar year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_number: String,
    pub supplier_id: Uuid,
    pub status: PoStatus,
    pub line_items: Vec<PoLineItem>,
    pub total_amount: Decimal,
    pub expected_delivery_date: Option<NaiveDate>,
    pub ai_reasoning: Option<String>,
    pub draft_email_subject: Option<String>,
    pub draft_email_body: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Output of the predictor-driven drafting step: recommended quantities and
/// the supplier-facing message. The PO engine joins these against the price
/// list to build priced line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftOrderPayload {
    pub lines: Vec<DraftOrderLine>,
    pub reasoning: String,
    pub email_subject: String,
    pub email_body: String,
}

/// Recommended order quantity for one SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftOrderLine {
    pub sku: String,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_only_from_draft_or_pending() {
        assert!(PoStatus::Draft.allows(PoAction::Approve));
        assert!(PoStatus::PendingApproval.allows(PoAction::Approve));
        assert!(!PoStatus::Approved.allows(PoAction::Approve));
        assert!(!PoStatus::Sent.allows(PoAction::Approve));
        assert!(!PoStatus::Received.allows(PoAction::Approve));
        assert!(!PoStatus::Cancelled.allows(PoAction::Approve));
    }

    #[test]
    fn send_only_from_approved() {
        assert!(PoStatus::Approved.allows(PoAction::Send));
        assert!(!PoStatus::Draft.allows(PoAction::Send));
        assert!(!PoStatus::Sent.allows(PoAction::Send));
    }

    #[test]
    fn receive_only_from_sent() {
        assert!(PoStatus::Sent.allows(PoAction::Receive));
        assert!(!PoStatus::Approved.allows(PoAction::Receive));
        // Receiving an already-received PO must be a rejected transition,
        // never a double-increment.
        assert!(!PoStatus::Received.allows(PoAction::Receive));
    }

    #[test]
    fn update_only_while_draft() {
        assert!(PoStatus::Draft.allows(PoAction::Update));
        assert!(!PoStatus::Approved.allows(PoAction::Update));
        assert!(!PoStatus::Sent.allows(PoAction::Update));
    }

    #[test]
    fn cancel_everywhere_except_received() {
        for status in [
            PoStatus::Draft,
            PoStatus::PendingApproval,
            PoStatus::Approved,
            PoStatus::Sent,
            PoStatus::Cancelled,
        ] {
            assert!(status.allows(PoAction::Cancel), "{:?}", status);
        }
        assert!(!PoStatus::Received.allows(PoAction::Cancel));
    }
}
