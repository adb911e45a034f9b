//! Background runtime: the daily forecast sweep and the two worker pools.
//!
//! The daily trigger computes its next fire time explicitly and sleeps until
//! then instead of polling the clock, so it cannot double-fire within a
//! window. Forecast workers share one queue under a bounded pool and a
//! sliding-window rate limit; the notification worker drains its own queue
//! unlimited. A failing job is logged and recorded, never crashes the
//! process, and never blocks other queued jobs.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{mpsc, Mutex};

use shared::types::Horizon;

use crate::config::SchedulerConfig;
use crate::error::AppResult;
use crate::jobs::{ForecastJob, JobQueue, NotificationJob, QueuedJob, SlidingWindowLimiter};
use crate::services::forecast::ForecastService;
use crate::services::notification::NotificationService;
use crate::services::predictor::DemandPredictor;
use crate::services::reorder::ReorderService;

/// Handles to the running queues, shared with the HTTP surface for status
/// reporting and manual sweeps.
#[derive(Clone)]
pub struct JobsHandle {
    pub forecast_queue: JobQueue<ForecastJob>,
    pub notification_queue: JobQueue<NotificationJob>,
}

/// When the daily trigger fires next: today at `hour_utc` if that is still
/// ahead, otherwise tomorrow.
pub fn next_fire_time(now: DateTime<Utc>, hour_utc: u32) -> DateTime<Utc> {
    let today_fire = now
        .date_naive()
        .and_hms_opt(hour_utc.min(23), 0, 0)
        .expect("in-range fire time")
        .and_utc();
    if today_fire > now {
        today_fire
    } else {
        today_fire + Duration::days(1)
    }
}

/// Enumerate low-stock SKUs and enqueue a 30-day forecast job for each.
/// Returns the number of jobs dispatched.
pub async fn run_sweep(
    reorder: &ReorderService,
    queue: &JobQueue<ForecastJob>,
) -> AppResult<usize> {
    let recommendations = reorder.low_stock_recommendations().await?;
    let mut dispatched = 0;
    for rec in &recommendations {
        match queue.enqueue(ForecastJob {
            sku: rec.sku.clone(),
            horizon_days: Horizon::Short.days(),
        }) {
            Ok(_) => dispatched += 1,
            Err(e) => {
                tracing::warn!(sku = %rec.sku, error = %e, "could not enqueue sweep job");
            }
        }
    }
    Ok(dispatched)
}

/// Spawn the scheduler and both worker pools on the current runtime.
pub fn spawn(
    db: PgPool,
    predictor: Arc<dyn DemandPredictor>,
    config: &SchedulerConfig,
) -> JobsHandle {
    let (forecast_queue, forecast_rx) =
        JobQueue::<ForecastJob>::new("forecast", config.queue_depth);
    let (notification_queue, notification_rx) =
        JobQueue::<NotificationJob>::new("notification", config.queue_depth);

    let handle = JobsHandle {
        forecast_queue: forecast_queue.clone(),
        notification_queue: notification_queue.clone(),
    };

    let limiter = Arc::new(SlidingWindowLimiter::new(
        config.forecast_jobs_per_minute.max(1),
        StdDuration::from_secs(60),
    ));
    let forecast_rx = Arc::new(Mutex::new(forecast_rx));
    let forecast_service = ForecastService::new(db.clone(), predictor);

    for worker_id in 0..config.forecast_workers.max(1) {
        tokio::spawn(forecast_worker_loop(
            worker_id,
            forecast_rx.clone(),
            forecast_queue.clone(),
            notification_queue.clone(),
            limiter.clone(),
            forecast_service.clone(),
        ));
    }

    tokio::spawn(notification_worker_loop(
        notification_rx,
        notification_queue,
        NotificationService::new(db.clone()),
    ));

    tokio::spawn(daily_trigger_loop(
        ReorderService::new(db),
        forecast_queue,
        config.daily_hour_utc,
    ));

    handle
}

async fn forecast_worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<QueuedJob<ForecastJob>>>>,
    queue: JobQueue<ForecastJob>,
    notification_queue: JobQueue<NotificationJob>,
    limiter: Arc<SlidingWindowLimiter>,
    forecasts: ForecastService,
) {
    tracing::info!(worker_id, "forecast worker started");
    loop {
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else { break };

        // Respect the predictor's external-call budget before doing work.
        limiter.acquire().await;

        let horizon = match Horizon::try_from(job.payload.horizon_days) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(worker_id, sku = %job.payload.sku, error = %e, "bad forecast job");
                queue.record_failed(&job, e);
                continue;
            }
        };

        // Re-running for the same (sku, horizon) is idempotent-safe: the
        // 24h freshness check turns a redelivery into a cache hit.
        match forecasts
            .generate_forecast(&job.payload.sku, horizon, false)
            .await
        {
            Ok(forecast) => {
                if forecast.reorder_recommendation.should_reorder {
                    let follow_on = NotificationJob {
                        sku: forecast.sku.clone(),
                        recommendation: forecast.reorder_recommendation.clone(),
                    };
                    if let Err(e) = notification_queue.enqueue(follow_on) {
                        tracing::warn!(sku = %forecast.sku, error = %e, "could not chain notification job");
                    }
                }
                queue.record_completed(&job);
            }
            Err(e) => {
                tracing::error!(worker_id, sku = %job.payload.sku, error = %e, "forecast job failed");
                queue.record_failed(&job, e.to_string());
            }
        }
    }
    tracing::info!(worker_id, "forecast worker stopped");
}

async fn notification_worker_loop(
    mut rx: mpsc::Receiver<QueuedJob<NotificationJob>>,
    queue: JobQueue<NotificationJob>,
    notifications: NotificationService,
) {
    tracing::info!("notification worker started");
    while let Some(job) = rx.recv().await {
        match notifications
            .record_low_stock(&job.payload.sku, &job.payload.recommendation)
            .await
        {
            Ok(_) => queue.record_completed(&job),
            Err(e) => {
                tracing::error!(sku = %job.payload.sku, error = %e, "notification job failed");
                queue.record_failed(&job, e.to_string());
            }
        }
    }
    tracing::info!("notification worker stopped");
}

async fn daily_trigger_loop(
    reorder: ReorderService,
    queue: JobQueue<ForecastJob>,
    hour_utc: u32,
) {
    loop {
        let now = Utc::now();
        let next = next_fire_time(now, hour_utc);
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::info!(next_fire = %next, "daily forecast sweep scheduled");
        tokio::time::sleep(wait).await;

        match run_sweep(&reorder, &queue).await {
            Ok(dispatched) => {
                tracing::info!(dispatched, "daily forecast sweep dispatched");
            }
            Err(e) => {
                tracing::error!(error = %e, "daily forecast sweep failed");
            }
        }
    }
}
