//! Durable job queue with at-least-once delivery semantics.
//!
//! Deliveries live in the same SQLite database as the records they
//! reference, so enqueueing participates in the creation transaction.
//! Each delivery carries an attempt counter and a counted-exception
//! counter; a claim reserves the delivery for the visibility timeout,
//! which is what guarantees a single active attempt per record.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rusqlite::Transaction;
use tokio::sync::Notify;

use crate::db::{queue_repo, Database, DatabaseError};
use crate::records::format_timestamp;

pub use crate::db::queue_repo::DeliveryRow as Delivery;

/// Retry and delivery tuning for the queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Deliveries per job before it is abandoned.
    pub max_attempts: u32,
    /// Counted exceptions before the job is abandoned, regardless of
    /// attempts remaining.
    pub max_exceptions: u32,
    /// How long a claim stays reserved before the delivery becomes
    /// claimable again. Must exceed the worker's attempt timeout.
    pub visibility_timeout: Duration,
    /// Delay before a released delivery becomes due again.
    pub retry_delay: Duration,
    /// How long an idle worker sleeps before re-polling for due work.
    pub idle_poll_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_exceptions: 2,
            visibility_timeout: Duration::from_secs(150),
            retry_delay: Duration::ZERO,
            idle_poll_interval: Duration::from_millis(500),
        }
    }
}

/// Handle to the durable delivery queue. Cloning is cheap; all clones
/// share the same database and wakeup channel.
#[derive(Clone)]
pub struct JobQueue {
    db: Database,
    config: Arc<QueueConfig>,
    wakeup: Arc<Notify>,
}

impl JobQueue {
    pub fn new(db: Database, config: QueueConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            wakeup: Arc::new(Notify::new()),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Enqueues one delivery for a translation inside the caller's
    /// transaction. Call [`wake`](Self::wake) after the commit.
    pub fn enqueue(
        &self,
        tx: &Transaction<'_>,
        translation_id: &str,
    ) -> Result<(), DatabaseError> {
        queue_repo::enqueue_tx(tx, translation_id, &format_timestamp(Utc::now()))
    }

    /// Wakes one idle worker. Separate from [`enqueue`](Self::enqueue)
    /// because a worker must not observe the delivery before the
    /// enqueueing transaction commits.
    pub fn wake(&self) {
        self.wakeup.notify_one();
    }

    /// Wakes every idle worker (used on shutdown).
    pub fn wake_all(&self) {
        self.wakeup.notify_waiters();
    }

    /// Claims the oldest due delivery, reserving it for the visibility
    /// timeout and bumping its attempt counter.
    pub fn claim(&self) -> Result<Option<Delivery>, DatabaseError> {
        let now = Utc::now();
        let reserved_until = now
            + chrono::Duration::from_std(self.config.visibility_timeout)
                .unwrap_or_else(|_| chrono::Duration::seconds(150));
        queue_repo::claim_due(
            &self.db,
            &format_timestamp(now),
            &format_timestamp(reserved_until),
        )
    }

    /// Releases a claimed delivery for redelivery after a failed attempt.
    pub fn release_for_retry(
        &self,
        delivery: &Delivery,
        count_exception: bool,
    ) -> Result<(), DatabaseError> {
        let available_at = Utc::now()
            + chrono::Duration::from_std(self.config.retry_delay)
                .unwrap_or_else(|_| chrono::Duration::zero());
        queue_repo::release(
            &self.db,
            delivery.id,
            count_exception,
            &format_timestamp(available_at),
        )
    }

    /// Removes a delivery once it is finally handled.
    pub fn ack(&self, delivery: &Delivery) -> Result<(), DatabaseError> {
        queue_repo::ack(&self.db, delivery.id)
    }

    /// Whether a job that just failed its attempt should be abandoned.
    ///
    /// `attempt` is the delivery's (1-based) attempt number and
    /// `exceptions` the counted exceptions including the current failure.
    pub fn retries_exhausted(&self, attempt: u32, exceptions: u32) -> bool {
        attempt >= self.config.max_attempts || exceptions >= self.config.max_exceptions
    }

    /// Parks the caller until new work is signalled or the idle poll
    /// interval elapses (whichever comes first). The interval bound is
    /// what picks up lapsed visibility reservations.
    pub async fn wait_for_work(&self) {
        tokio::select! {
            _ = self.wakeup.notified() => {}
            _ = tokio::time::sleep(self.config.idle_poll_interval) => {}
        }
    }

    /// Deliveries currently in the queue (claimed or not).
    pub fn depth(&self) -> Result<u64, DatabaseError> {
        queue_repo::depth(&self.db)
    }
}
