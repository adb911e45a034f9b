//! Scheduler and job infrastructure tests
//!
//! Covers:
//! - Next-fire-time computation (no double-fire within a window)
//! - Sliding-window rate limiting
//! - Queue dispatch failure and retention behavior
//! - Job payload wire shapes

use chrono::{DateTime, Timelike, Utc};
use proptest::prelude::*;
use std::time::{Duration, Instant};

use drp_backend::jobs::scheduler::next_fire_time;
use drp_backend::jobs::{ForecastJob, JobQueue, NotificationJob, SlidingWindowLimiter};
use shared::models::ReorderRecommendation;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn fires_today_before_the_hour_and_tomorrow_after() {
        assert_eq!(
            next_fire_time(at("2024-08-01T01:59:59Z"), 2),
            at("2024-08-01T02:00:00Z")
        );
        assert_eq!(
            next_fire_time(at("2024-08-01T02:00:00Z"), 2),
            at("2024-08-02T02:00:00Z")
        );
        assert_eq!(
            next_fire_time(at("2024-08-01T23:10:00Z"), 2),
            at("2024-08-02T02:00:00Z")
        );
    }

    /// Recomputing at the fire instant schedules the next day: the trigger
    /// cannot fire twice inside one window.
    #[test]
    fn no_double_fire() {
        let fire = at("2024-08-01T02:00:00Z");
        let next = next_fire_time(fire, 2);
        assert!(next > fire);
        assert_eq!(next, at("2024-08-02T02:00:00Z"));
    }

    #[test]
    fn limiter_enforces_window_budget() {
        let limiter = SlidingWindowLimiter::new(10, Duration::from_secs(60));
        let t0 = Instant::now();

        for i in 0..10 {
            assert!(limiter.admit_at(t0 + Duration::from_secs(i)).is_ok(), "job {}", i);
        }
        // Eleventh inside the window is refused with the residual wait.
        let refused = limiter.admit_at(t0 + Duration::from_secs(30));
        assert_eq!(refused, Err(Duration::from_secs(30)));

        // Once the oldest admission ages out, capacity returns.
        assert!(limiter.admit_at(t0 + Duration::from_secs(60)).is_ok());
    }

    #[tokio::test]
    async fn full_queue_is_a_dispatch_failure() {
        let (queue, _rx) = JobQueue::<ForecastJob>::new("forecast", 2);
        for sku in ["A", "B"] {
            queue
                .enqueue(ForecastJob {
                    sku: sku.to_string(),
                    horizon_days: 30,
                })
                .unwrap();
        }
        assert!(queue
            .enqueue(ForecastJob {
                sku: "C".to_string(),
                horizon_days: 30,
            })
            .is_err());
        assert_eq!(queue.queued_len(), 2);
    }

    #[test]
    fn notification_payload_wire_shape() {
        let job = NotificationJob {
            sku: "SKU-3".to_string(),
            recommendation: ReorderRecommendation {
                should_reorder: true,
                suggested_qty: 40,
                reasoning: "stock below safety level".to_string(),
            },
        };
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["sku"], "SKU-3");
        assert_eq!(json["recommendation"]["should_reorder"], true);
        assert_eq!(json["recommendation"]["suggested_qty"], 40);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The next fire time is strictly in the future, lands on the
        /// requested hour exactly, and is never more than a day away.
        #[test]
        fn next_fire_time_invariants(
            secs in 0i64..4_000_000_000,
            hour in 0u32..24
        ) {
            let now = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
            let next = next_fire_time(now, hour);

            prop_assert!(next > now);
            prop_assert!(next - now <= chrono::Duration::days(1));
            prop_assert_eq!(next.hour(), hour);
            prop_assert_eq!(next.minute(), 0);
            prop_assert_eq!(next.second(), 0);
        }

        /// The limiter never admits more than its budget inside any single
        /// window, no matter how requests cluster.
        #[test]
        fn limiter_budget_holds(
            max in 1usize..20,
            offsets in prop::collection::vec(0u64..120, 1..200)
        ) {
            let window = Duration::from_secs(60);
            let limiter = SlidingWindowLimiter::new(max, window);
            let t0 = Instant::now();

            let mut offsets = offsets;
            offsets.sort_unstable();

            let mut admitted: Vec<u64> = Vec::new();
            for offset in offsets {
                if limiter.admit_at(t0 + Duration::from_secs(offset)).is_ok() {
                    admitted.push(offset);
                }
            }

            // Count admissions inside every window ending at an admission.
            for (i, end) in admitted.iter().enumerate() {
                let in_window = admitted[..=i]
                    .iter()
                    .filter(|start| *end - **start < 60)
                    .count();
                prop_assert!(in_window <= max, "window ending at {} held {}", end, in_window);
            }
        }
    }
}
