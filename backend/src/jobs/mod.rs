//! Job queue primitives: bounded in-process queues, completed/failed
//! retention, and the sliding-window rate limiter for predictor-bound work.

pub mod scheduler;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

use shared::models::ReorderRecommendation;

use crate::error::{AppError, AppResult};

/// Payload of a forecast job.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct ForecastJob {
    pub sku: String,
    pub horizon_days: i32,
}

/// Payload of a low-stock notification job, chained from a forecast whose
/// reorder signal came back positive.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct NotificationJob {
    pub sku: String,
    pub recommendation: ReorderRecommendation,
}

/// Retention caps per queue.
const COMPLETED_RETENTION: usize = 100;
const FAILED_RETENTION: usize = 50;

/// Outcome record kept for operator inspection.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub queue: String,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bounded ring of recent job outcomes for one queue.
#[derive(Debug, Default)]
pub struct JobHistory {
    completed: VecDeque<JobRecord>,
    failed: VecDeque<JobRecord>,
}

impl JobHistory {
    pub fn push_completed(&mut self, record: JobRecord) {
        if self.completed.len() == COMPLETED_RETENTION {
            self.completed.pop_front();
        }
        self.completed.push_back(record);
    }

    pub fn push_failed(&mut self, record: JobRecord) {
        if self.failed.len() == FAILED_RETENTION {
            self.failed.pop_front();
        }
        self.failed.push_back(record);
    }

    pub fn completed(&self) -> impl Iterator<Item = &JobRecord> {
        self.completed.iter()
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobRecord> {
        self.failed.iter()
    }
}

/// A job travelling through a queue.
#[derive(Debug)]
pub struct QueuedJob<T> {
    pub id: Uuid,
    pub payload: T,
    pub enqueued_at: DateTime<Utc>,
}

/// Sending half of one logical job queue, plus its outcome history.
pub struct JobQueue<T> {
    name: &'static str,
    tx: mpsc::Sender<QueuedJob<T>>,
    history: Arc<Mutex<JobHistory>>,
}

impl<T> Clone for JobQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            history: self.history.clone(),
        }
    }
}

impl<T: Serialize> JobQueue<T> {
    /// Create a queue with a bounded depth, returning the consuming half.
    pub fn new(name: &'static str, depth: usize) -> (Self, mpsc::Receiver<QueuedJob<T>>) {
        let (tx, rx) = mpsc::channel(depth);
        (
            Self {
                name,
                tx,
                history: Arc::new(Mutex::new(JobHistory::default())),
            },
            rx,
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enqueue without blocking; a full or closed queue is a dispatch
    /// failure the caller can surface or retry.
    pub fn enqueue(&self, payload: T) -> AppResult<Uuid> {
        let job = QueuedJob {
            id: Uuid::new_v4(),
            payload,
            enqueued_at: Utc::now(),
        };
        let id = job.id;
        self.tx.try_send(job).map_err(|e| {
            AppError::QueueDispatchFailure(format!("queue '{}': {}", self.name, e))
        })?;
        Ok(id)
    }

    /// Jobs currently waiting in the channel.
    pub fn queued_len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn record_completed(&self, job: &QueuedJob<T>) {
        let record = self.record_for(job, None);
        self.history.lock().expect("history lock").push_completed(record);
    }

    pub fn record_failed(&self, job: &QueuedJob<T>, error: String) {
        let record = self.record_for(job, Some(error));
        self.history.lock().expect("history lock").push_failed(record);
    }

    fn record_for(&self, job: &QueuedJob<T>, error: Option<String>) -> JobRecord {
        JobRecord {
            id: job.id,
            queue: self.name.to_string(),
            payload: serde_json::to_value(&job.payload).unwrap_or(serde_json::Value::Null),
            enqueued_at: job.enqueued_at,
            finished_at: Utc::now(),
            error,
        }
    }

    pub fn completed_snapshot(&self) -> Vec<JobRecord> {
        self.history
            .lock()
            .expect("history lock")
            .completed()
            .cloned()
            .collect()
    }

    pub fn failed_snapshot(&self) -> Vec<JobRecord> {
        self.history
            .lock()
            .expect("history lock")
            .failed()
            .cloned()
            .collect()
    }
}

/// Sliding-window rate limiter: at most `max` admissions per `window`.
///
/// `admit_at` is the pure core (injectable clock for tests); `acquire`
/// sleeps until a slot frees up.
pub struct SlidingWindowLimiter {
    max: usize,
    window: Duration,
    stamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            stamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Try to admit at `now`; on refusal returns how long until the oldest
    /// admission slides out of the window.
    pub fn admit_at(&self, now: Instant) -> Result<(), Duration> {
        let mut stamps = self.stamps.lock().expect("limiter lock");
        while let Some(front) = stamps.front() {
            if now.duration_since(*front) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }
        if stamps.len() < self.max {
            stamps.push_back(now);
            Ok(())
        } else {
            let front = *stamps.front().expect("non-empty at capacity");
            Err(self.window - now.duration_since(front))
        }
    }

    /// Wait until a slot is available.
    pub async fn acquire(&self) {
        loop {
            match self.admit_at(Instant::now()) {
                Ok(()) => return,
                Err(wait) => tokio::time::sleep(wait).await,
            }
        }
    }
}
