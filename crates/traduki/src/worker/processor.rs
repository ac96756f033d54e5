//! One delivery attempt of a translation job.
//!
//! The processor owns the record's state machine:
//! Pending → Processing → {Completed, Failed}. Every attempt re-enters at
//! the Processing transition; terminal records are left untouched, so a
//! redelivered job that already finished is a no-op.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::provider::TranslationProvider;
use crate::queue::{Delivery, JobQueue};
use crate::records::RecordStore;

/// Wall-clock bound for a full attempt, external call included. The
/// queue's visibility timeout must be longer than this.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

/// What a single delivery attempt amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Translation stored, record Completed.
    Completed,
    /// Attempt failed; the delivery was released for redelivery.
    Retrying,
    /// Retries exhausted; record Failed.
    Failed,
    /// Nothing to do (terminal record or missing record).
    Skipped,
}

/// Executes delivery attempts against the record store and provider.
pub struct JobProcessor {
    store: RecordStore,
    queue: JobQueue,
    provider: Arc<dyn TranslationProvider>,
    attempt_timeout: Duration,
}

impl JobProcessor {
    pub fn new(
        store: RecordStore,
        queue: JobQueue,
        provider: Arc<dyn TranslationProvider>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            store,
            queue,
            provider,
            attempt_timeout,
        }
    }

    /// Processes one claimed delivery through the state machine.
    pub async fn process(&self, delivery: Delivery) -> AttemptOutcome {
        let span = info_span!(
            "process_translation",
            translation_id = %delivery.translation_id,
            attempt = delivery.attempts,
        );
        self.process_inner(delivery).instrument(span).await
    }

    async fn process_inner(&self, delivery: Delivery) -> AttemptOutcome {
        let record = match self.store.find_by_id(&delivery.translation_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(
                    "Delivery references missing translation {}, abandoning",
                    delivery.translation_id
                );
                self.ack_logged(&delivery);
                return AttemptOutcome::Skipped;
            }
            Err(e) => {
                return self
                    .handle_failure(&delivery, format!("record lookup failed: {}", e), true)
                    .await;
            }
        };

        if record.status.is_terminal() {
            debug!(
                "Translation {} already {}, redelivery is a no-op",
                record.id, record.status
            );
            self.ack_logged(&delivery);
            return AttemptOutcome::Skipped;
        }

        if let Err(e) = self.store.mark_processing(&delivery.translation_id) {
            return self
                .handle_failure(
                    &delivery,
                    format!("failed to persist processing status: {}", e),
                    true,
                )
                .await;
        }

        let call = self.provider.translate(
            &record.original_content,
            &record.source_language,
            &record.target_language,
        );

        match tokio::time::timeout(self.attempt_timeout, call).await {
            Ok(Ok(translated)) => {
                if let Err(e) = self.store.mark_completed(&delivery.translation_id, &translated)
                {
                    return self
                        .handle_failure(
                            &delivery,
                            format!("failed to persist translation result: {}", e),
                            true,
                        )
                        .await;
                }
                info!(
                    "Translation completed: request_id={} target_language={}",
                    record.id, record.target_language
                );
                self.ack_logged(&delivery);
                AttemptOutcome::Completed
            }
            Ok(Err(e)) => self.handle_failure(&delivery, e.to_string(), true).await,
            // A timed-out attempt consumes an attempt but is not a counted
            // exception.
            Err(_) => {
                self.handle_failure(
                    &delivery,
                    format!(
                        "processing attempt timed out after {}s",
                        self.attempt_timeout.as_secs()
                    ),
                    false,
                )
                .await
            }
        }
    }

    /// Converts any attempt failure into a retry or terminal Failed state,
    /// depending on the delivery's counters.
    async fn handle_failure(
        &self,
        delivery: &Delivery,
        error_message: String,
        count_exception: bool,
    ) -> AttemptOutcome {
        let exceptions = delivery.exceptions + count_exception as u32;

        if self.queue.retries_exhausted(delivery.attempts, exceptions) {
            error!(
                "Translation job failed after all retries: {} request_id={} attempts={}",
                error_message, delivery.translation_id, delivery.attempts
            );
            // Best-effort terminal persistence; if it fails the job is
            // abandoned rather than retried forever.
            if let Err(e) = self
                .store
                .mark_failed(&delivery.translation_id, &error_message)
            {
                error!(
                    "Abandoning translation {}: failed to persist failure state: {}",
                    delivery.translation_id, e
                );
            }
            self.ack_logged(delivery);
            AttemptOutcome::Failed
        } else {
            warn!(
                "Translation attempt {} failed for {}, will retry: {}",
                delivery.attempts, delivery.translation_id, error_message
            );
            // If the release itself fails, the visibility timeout will
            // surface the delivery again.
            if let Err(e) = self.queue.release_for_retry(delivery, count_exception) {
                error!(
                    "Failed to release delivery for {}: {}",
                    delivery.translation_id, e
                );
            }
            AttemptOutcome::Retrying
        }
    }

    fn ack_logged(&self, delivery: &Delivery) {
        if let Err(e) = self.queue.ack(delivery) {
            error!(
                "Failed to ack delivery for {}: {}",
                delivery.translation_id, e
            );
        }
    }
}
