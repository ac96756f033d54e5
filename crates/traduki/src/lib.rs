pub mod config;
pub mod db;
pub mod error;
pub mod provider;
pub mod queue;
pub mod records;
pub mod secrets;
pub mod service;
pub mod worker;

pub use config::{load_config, Config};
pub use error::{ConfigError, Result, TradukiError};
pub use provider::{OpenAiTranslator, ProviderConfig, ProviderError, TranslationProvider};
pub use queue::{JobQueue, QueueConfig};
pub use records::{ListFilter, Page, RecordStore, TranslationRecord, TranslationStatus, PER_PAGE};
pub use secrets::{resolve_secret, SecretError};
pub use service::{NewTranslationRequest, TranslationService};
pub use worker::{AttemptOutcome, JobProcessor, WorkerPool};
