//! Purchase order lifecycle tests
//!
//! Covers:
//! - State machine guard rejections from every disallowed source state
//! - PO number formatting, parsing and per-year sequencing
//! - Receipt audit arithmetic (real before/after quantities)

use proptest::prelude::*;

use drp_backend::services::inventory::AppliedDelta;
use drp_backend::services::purchase_order::{format_po_number, parse_po_sequence};
use shared::models::{PoAction, PoStatus};

const ALL_STATUSES: [PoStatus; 6] = [
    PoStatus::Draft,
    PoStatus::PendingApproval,
    PoStatus::Approved,
    PoStatus::Sent,
    PoStatus::Received,
    PoStatus::Cancelled,
];

const ALL_ACTIONS: [PoAction; 5] = [
    PoAction::Approve,
    PoAction::Send,
    PoAction::Receive,
    PoAction::Update,
    PoAction::Cancel,
];

/// The allowed-transition table: draft -> approved -> sent -> received,
/// cancellation from anywhere but received, edits while draft only.
fn expected_allowed(status: PoStatus, action: PoAction) -> bool {
    match action {
        PoAction::Approve => matches!(status, PoStatus::Draft | PoStatus::PendingApproval),
        PoAction::Send => matches!(status, PoStatus::Approved),
        PoAction::Receive => matches!(status, PoStatus::Sent),
        PoAction::Update => matches!(status, PoStatus::Draft),
        PoAction::Cancel => !matches!(status, PoStatus::Received),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Exhaustive guard check over every (status, action) pair.
    #[test]
    fn state_machine_guard_matrix() {
        for status in ALL_STATUSES {
            for action in ALL_ACTIONS {
                assert_eq!(
                    status.allows(action),
                    expected_allowed(status, action),
                    "{:?} / {:?}",
                    status,
                    action
                );
            }
        }
    }

    /// Sending a PO that is still a draft must be rejected.
    #[test]
    fn send_from_draft_is_rejected() {
        assert!(!PoStatus::Draft.allows(PoAction::Send));
    }

    /// Cancelling a received PO must be rejected.
    #[test]
    fn cancel_after_receipt_is_rejected() {
        assert!(!PoStatus::Received.allows(PoAction::Cancel));
    }

    /// Receiving twice cannot happen: once received, receive is no longer
    /// allowed, so a redelivered receipt job cannot double-increment stock.
    #[test]
    fn receive_is_not_reentrant() {
        assert!(PoStatus::Sent.allows(PoAction::Receive));
        assert!(!PoStatus::Received.allows(PoAction::Receive));
    }

    #[test]
    fn po_number_has_year_and_padded_sequence() {
        assert_eq!(format_po_number(2024, 1), "PO-2024-0001");
        assert_eq!(format_po_number(2024, 217), "PO-2024-0217");
    }

    #[test]
    fn sequence_parsing_is_yearbound() {
        assert_eq!(parse_po_sequence("PO-2024-0031", 2024), Some(31));
        assert_eq!(parse_po_sequence("PO-2024-0031", 2025), None);
        assert_eq!(parse_po_sequence("garbage", 2024), None);
    }

    /// Receipt audit entries carry real before/after values: the delta
    /// update returns the post-receipt quantity and the pre-receipt value is
    /// reconstructed from it, never guessed.
    #[test]
    fn receipt_audit_arithmetic() {
        let applied = AppliedDelta {
            sku: "SKU-A".to_string(),
            qty_change: 10,
            qty_before: 7,
            qty_after: 17,
        };
        assert_eq!(applied.qty_before + applied.qty_change, applied.qty_after);

        let second = AppliedDelta {
            sku: "SKU-B".to_string(),
            qty_change: 5,
            qty_before: 0,
            qty_after: 5,
        };
        assert_eq!(second.qty_after - second.qty_change, second.qty_before);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = PoStatus> {
        prop_oneof![
            Just(PoStatus::Draft),
            Just(PoStatus::PendingApproval),
            Just(PoStatus::Approved),
            Just(PoStatus::Sent),
            Just(PoStatus::Received),
            Just(PoStatus::Cancelled),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Formatting and parsing are inverse for any in-range sequence.
        #[test]
        fn po_number_round_trip(year in 2000i32..2100, seq in 1u32..10_000) {
            let po_number = format_po_number(year, seq);
            prop_assert_eq!(parse_po_sequence(&po_number, year), Some(seq));
        }

        /// Within a year, lexical order of PO numbers matches numeric
        /// sequence order, so MAX(po_number) under the year prefix finds the
        /// true high-water mark.
        #[test]
        fn lexical_order_matches_sequence_order(
            year in 2000i32..2100,
            a in 1u32..10_000,
            b in 1u32..10_000
        ) {
            let po_a = format_po_number(year, a);
            let po_b = format_po_number(year, b);
            prop_assert_eq!(a.cmp(&b), po_a.cmp(&po_b));
        }

        /// Deriving the next number from any existing one strictly
        /// increases the sequence.
        #[test]
        fn next_number_strictly_increases(year in 2000i32..2100, seq in 1u32..9_999) {
            let current = format_po_number(year, seq);
            let next_seq = parse_po_sequence(&current, year).unwrap() + 1;
            prop_assert!(format_po_number(year, next_seq) > current);
        }

        /// Received is terminal: no action may leave it.
        #[test]
        fn received_is_terminal(status in status_strategy()) {
            if status == PoStatus::Received {
                for action in ALL_ACTIONS {
                    prop_assert!(!status.allows(action));
                }
            }
        }

        /// Every status allows at most the actions in the transition table.
        #[test]
        fn guard_never_exceeds_table(status in status_strategy()) {
            for action in ALL_ACTIONS {
                prop_assert_eq!(status.allows(action), expected_allowed(status, action));
            }
        }
    }
}
