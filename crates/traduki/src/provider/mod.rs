//! External translation provider interface.
//!
//! The worker only knows the [`TranslationProvider`] trait; the concrete
//! OpenAI-compatible client lives in [`openai`]. Retry is the worker's
//! responsibility; a provider reports each call's outcome and nothing else.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

pub mod openai;

pub use openai::{OpenAiTranslator, ProviderConfig};

/// Target languages the service accepts.
pub const SUPPORTED_TARGET_LANGUAGES: &[&str] = &["es", "fr", "de", "it", "pt"];

/// Maps a target language code to the human-readable name used in the
/// provider prompt. Unknown codes fall back to Spanish.
pub fn language_name(code: &str) -> &'static str {
    match code {
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        _ => "Spanish",
    }
}

/// Errors from a single provider call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure (connect, TLS, request build).
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request payload could not be serialized.
    #[error("failed to serialize content payload: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The response body was not valid JSON.
    #[error("provider response is not valid JSON: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The response decoded, but `choices[0].message.content` is absent.
    #[error("invalid response format: missing choices[0].message.content")]
    MissingContent,

    /// The completion text itself was not a valid JSON object of strings.
    #[error("invalid JSON in provider response content: {0}")]
    InvalidContentJson(#[source] serde_json::Error),
}

/// A stateless translation backend.
///
/// `content` is the field map to translate; implementations must return a
/// map with the same keys and translated values.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(
        &self,
        content: &BTreeMap<String, String>,
        source_language: &str,
        target_language: &str,
    ) -> Result<BTreeMap<String, String>, ProviderError>;
}
