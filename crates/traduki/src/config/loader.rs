use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path()))
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Validate version
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.provider.base_url.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "provider.base_url must not be empty".to_string(),
        });
    }

    if config.provider.max_tokens == 0 {
        return Err(ConfigError::Validation {
            message: "provider.max_tokens must be at least 1".to_string(),
        });
    }

    if !(0.0..=2.0).contains(&config.provider.temperature) {
        return Err(ConfigError::Validation {
            message: format!(
                "provider.temperature must be within 0.0..=2.0, got {}",
                config.provider.temperature
            ),
        });
    }

    if config.worker.max_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "worker.max_attempts must be at least 1".to_string(),
        });
    }

    if config.worker.max_exceptions == 0 {
        return Err(ConfigError::Validation {
            message: "worker.max_exceptions must be at least 1".to_string(),
        });
    }

    if let Some(count) = config.worker.count {
        if count == 0 {
            return Err(ConfigError::Validation {
                message: "worker.count must be at least 1".to_string(),
            });
        }
    }

    // A reservation shorter than the attempt bound would let a second
    // worker claim a job that is still being processed.
    if config.worker.visibility_timeout_secs <= config.worker.attempt_timeout_secs {
        return Err(ConfigError::Validation {
            message: format!(
                "worker.visibility_timeout_secs ({}) must exceed attempt_timeout_secs ({})",
                config.worker.visibility_timeout_secs, config.worker.attempt_timeout_secs
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "version": "1.0",
        "provider": { "api_key_env_var": "OPENAI_API_KEY" }
    }"#;

    #[test]
    fn test_minimal_config_with_defaults() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.provider.max_tokens, 2000);
        assert_eq!(config.provider.temperature, 0.3);
        assert_eq!(config.worker.max_attempts, 3);
        assert_eq!(config.worker.max_exceptions, 2);
        assert_eq!(config.worker.attempt_timeout_secs, 120);
    }

    #[test]
    fn test_full_config() {
        let config = load_config_from_str(
            r#"{
                "version": "1.0",
                "server": { "host": "0.0.0.0", "port": 9000 },
                "database": { "path": "/tmp/traduki-test.db" },
                "provider": {
                    "base_url": "https://llm.internal/v1",
                    "api_key": "sk-test",
                    "model": "gpt-4o-mini",
                    "max_tokens": 1000,
                    "temperature": 0.0
                },
                "worker": {
                    "count": 2,
                    "max_attempts": 5,
                    "max_exceptions": 3,
                    "attempt_timeout_secs": 60,
                    "visibility_timeout_secs": 90
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.worker.worker_count(), 2);
        let queue = config.worker.queue_config();
        assert_eq!(queue.max_attempts, 5);
        assert_eq!(queue.visibility_timeout.as_secs(), 90);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let result = load_config_from_str(
            r#"{ "version": "2.0", "provider": { "api_key": "k" } }"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_missing_provider() {
        let result = load_config_from_str(r#"{ "version": "1.0" }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let result = load_config_from_str(
            r#"{ "version": "1.0", "provider": { "api_key": "k", "temperature": 3.5 } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_visibility_shorter_than_attempt() {
        let result = load_config_from_str(
            r#"{
                "version": "1.0",
                "provider": { "api_key": "k" },
                "worker": { "attempt_timeout_secs": 120, "visibility_timeout_secs": 120 }
            }"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_zero_worker_count() {
        let result = load_config_from_str(
            r#"{
                "version": "1.0",
                "provider": { "api_key": "k" },
                "worker": { "count": 0 }
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }
}
