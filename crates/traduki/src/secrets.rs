//! Unified secret resolution from multiple sources.
//!
//! The provider API key can come from any of three places, tried in
//! priority order to support different deployment styles:
//!
//! 1. **Direct value** - for quick local testing (`api_key: "sk-..."`)
//! 2. **File reference** - for Docker secrets (`api_key_file: /run/secrets/key`)
//! 3. **Env var reference** - for Kubernetes/production (`api_key_env_var: OPENAI_API_KEY`)

use secrecy::SecretString;
use std::fs;

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

/// Resolves a secret from multiple sources in priority order:
/// 1. Direct value (if provided and non-empty)
/// 2. File contents (if path provided; trailing whitespace trimmed)
/// 3. Environment variable (if name provided)
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString, SecretError> {
    if let Some(value) = direct {
        if !value.is_empty() {
            return Ok(SecretString::from(value.to_string()));
        }
    }

    if let Some(path) = file_path {
        let contents = fs::read_to_string(path).map_err(|source| SecretError::FileReadError {
            path: path.to_string(),
            source,
        })?;
        return Ok(SecretString::from(contents.trim_end().to_string()));
    }

    if let Some(name) = env_var {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value)),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_direct_value_takes_priority() {
        let secret = resolve_secret(Some("direct-key"), Some("/nonexistent"), None).unwrap();
        assert_eq!(secret.expose_secret(), "direct-key");
    }

    #[test]
    fn test_empty_direct_value_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "file-key").unwrap();

        let secret =
            resolve_secret(Some(""), Some(path.to_str().unwrap()), None).unwrap();
        assert_eq!(secret.expose_secret(), "file-key");
    }

    #[test]
    fn test_file_source_trims_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, "file-key\n").unwrap();

        let secret = resolve_secret(None, Some(path.to_str().unwrap()), None).unwrap();
        assert_eq!(secret.expose_secret(), "file-key");
    }

    #[test]
    fn test_missing_file_errors() {
        let err = resolve_secret(None, Some("/definitely/not/here"), None).unwrap_err();
        assert!(matches!(err, SecretError::FileReadError { .. }));
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_source() {
        std::env::set_var("TRADUKI_TEST_SECRET", "env-key");
        let secret = resolve_secret(None, None, Some("TRADUKI_TEST_SECRET")).unwrap();
        assert_eq!(secret.expose_secret(), "env-key");
        std::env::remove_var("TRADUKI_TEST_SECRET");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_missing_errors() {
        std::env::remove_var("TRADUKI_TEST_SECRET_MISSING");
        let err = resolve_secret(None, None, Some("TRADUKI_TEST_SECRET_MISSING")).unwrap_err();
        assert!(matches!(err, SecretError::EnvVarNotSet { .. }));
    }

    #[test]
    fn test_no_source_errors() {
        let err = resolve_secret(None, None, None).unwrap_err();
        assert!(matches!(err, SecretError::NoSourceProvided));
    }
}
