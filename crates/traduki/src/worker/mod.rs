//! Background processing of queued translation jobs.

pub mod pool;
pub mod processor;

pub use pool::WorkerPool;
pub use processor::{AttemptOutcome, JobProcessor};
