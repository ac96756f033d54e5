use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::provider::ProviderConfig;
use crate::queue::QueueConfig;
use crate::secrets::{resolve_secret, SecretError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub worker: WorkerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path. Defaults to `~/.traduki/data/traduki.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key sources, tried in priority order (see `secrets`).
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default)]
    pub api_key_env_var: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ProviderSettings {
    /// Resolves the API key from the configured sources.
    pub fn resolve_api_key(&self) -> Result<SecretString, SecretError> {
        resolve_secret(
            self.api_key.as_deref(),
            self.api_key_file.as_deref(),
            self.api_key_env_var.as_deref(),
        )
    }

    /// Builds the explicit client configuration with the resolved key.
    pub fn to_provider_config(&self, api_key: SecretString) -> ProviderConfig {
        ProviderConfig {
            base_url: self.base_url.clone(),
            api_key,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Worker task count; defaults to one per core, capped.
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_max_exceptions")]
    pub max_exceptions: u32,
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,
    #[serde(default)]
    pub retry_delay_secs: u64,
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_max_exceptions() -> u32 {
    2
}

fn default_attempt_timeout_secs() -> u64 {
    120
}

fn default_visibility_timeout_secs() -> u64 {
    150
}

fn default_idle_poll_ms() -> u64 {
    500
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            count: None,
            max_attempts: default_max_attempts(),
            max_exceptions: default_max_exceptions(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            retry_delay_secs: 0,
            idle_poll_ms: default_idle_poll_ms(),
        }
    }
}

impl WorkerSettings {
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_attempts: self.max_attempts,
            max_exceptions: self.max_exceptions,
            visibility_timeout: Duration::from_secs(self.visibility_timeout_secs),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            idle_poll_interval: Duration::from_millis(self.idle_poll_ms),
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn worker_count(&self) -> usize {
        self.count
            .unwrap_or_else(crate::worker::pool::default_worker_count)
    }
}
