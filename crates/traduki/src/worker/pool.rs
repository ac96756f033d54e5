//! Worker pool that drains the delivery queue.
//!
//! Each worker is a tokio task looping claim → process → park. Parking
//! wakes on enqueue notifications and on a timed poll, which is how lapsed
//! visibility reservations get picked back up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::queue::JobQueue;
use crate::worker::processor::JobProcessor;

/// Default worker count: one per core, capped. Translation jobs spend
/// their time waiting on the provider, not on CPU.
pub fn default_worker_count() -> usize {
    num_cpus::get().clamp(1, 4)
}

pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    queue: JobQueue,
}

impl WorkerPool {
    /// Spawns `worker_count` workers on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn start(processor: Arc<JobProcessor>, queue: JobQueue, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let worker_processor = Arc::clone(&processor);
            let worker_queue = queue.clone();
            let shutdown_flag = Arc::clone(&shutdown);

            workers.push(tokio::spawn(run_worker(
                worker_id,
                worker_processor,
                worker_queue,
                shutdown_flag,
            )));
        }

        info!("Started {} translation workers", worker_count);

        Self {
            workers,
            shutdown,
            queue,
        }
    }

    /// Signals all workers to stop after their current attempt.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
        self.queue.wake_all();
    }

    /// Waits for every worker to finish. Call [`shutdown`](Self::shutdown)
    /// first.
    pub async fn wait(self) {
        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }
        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

async fn run_worker(
    worker_id: usize,
    processor: Arc<JobProcessor>,
    queue: JobQueue,
    shutdown: Arc<AtomicBool>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match queue.claim() {
            Ok(Some(delivery)) => {
                debug!(
                    "Worker {} processing translation {}",
                    worker_id, delivery.translation_id
                );
                processor.process(delivery).await;
            }
            Ok(None) => {
                queue.wait_for_work().await;
            }
            Err(e) => {
                error!("Worker {}: failed to claim from queue: {}", worker_id, e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use async_trait::async_trait;

    use crate::db::Database;
    use crate::provider::{ProviderError, TranslationProvider};
    use crate::queue::QueueConfig;
    use crate::records::{RecordStore, TranslationStatus};
    use crate::service::{NewTranslationRequest, TranslationService};
    use crate::worker::processor::DEFAULT_ATTEMPT_TIMEOUT;

    struct EchoProvider;

    #[async_trait]
    impl TranslationProvider for EchoProvider {
        async fn translate(
            &self,
            content: &BTreeMap<String, String>,
            _source_language: &str,
            _target_language: &str,
        ) -> Result<BTreeMap<String, String>, ProviderError> {
            Ok(content
                .iter()
                .map(|(k, v)| (k.clone(), format!("[es] {}", v)))
                .collect())
        }
    }

    fn fast_queue(db: &Database) -> JobQueue {
        JobQueue::new(
            db.clone(),
            QueueConfig {
                idle_poll_interval: Duration::from_millis(10),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_pool_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let queue = fast_queue(&db);
        let store = RecordStore::new(db);
        let processor = Arc::new(JobProcessor::new(
            store,
            queue.clone(),
            Arc::new(EchoProvider),
            DEFAULT_ATTEMPT_TIMEOUT,
        ));

        let pool = WorkerPool::start(processor, queue, 2);
        assert!(!pool.is_shutdown());

        pool.shutdown();
        assert!(pool.is_shutdown());
        pool.wait().await;
    }

    #[tokio::test]
    async fn test_pool_processes_created_request() {
        let db = Database::open_in_memory().unwrap();
        let queue = fast_queue(&db);
        let store = RecordStore::new(db.clone());
        let service =
            TranslationService::new(db, store.clone(), queue.clone());

        let processor = Arc::new(JobProcessor::new(
            store.clone(),
            queue.clone(),
            Arc::new(EchoProvider),
            DEFAULT_ATTEMPT_TIMEOUT,
        ));
        let pool = WorkerPool::start(processor, queue, 2);

        let record = service
            .create_translation_request(NewTranslationRequest::new(
                "John Doe".to_string(),
                "Welcome Message".to_string(),
                "This is a welcome message for our users.".to_string(),
                Some("es".to_string()),
            ))
            .unwrap();
        assert_eq!(record.status, TranslationStatus::Pending);

        // Poll until the worker finishes the job.
        let mut completed = None;
        for _ in 0..200 {
            let current = store.find_by_id(&record.id).unwrap().unwrap();
            if current.status.is_terminal() {
                completed = Some(current);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let completed = completed.expect("worker should reach a terminal state");
        assert_eq!(completed.status, TranslationStatus::Completed);
        let translated = completed.translated_content.unwrap();
        assert_eq!(
            translated.get("name").map(String::as_str),
            Some("[es] John Doe")
        );

        pool.shutdown();
        pool.wait().await;
    }
}
