//! OpenAI-compatible chat-completions client for translation.
//!
//! Sends one request per translation attempt: a system message fixing the
//! translator persona and structure-preservation rules, and a user message
//! carrying the content map serialized as a JSON string. The provider is
//! expected to answer with that same structure translated, wrapped in the
//! usual chat-completion envelope, so the response is decoded twice: the
//! envelope first, then the completion text as its own JSON document.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{language_name, ProviderError, TranslationProvider};

/// Maximum length for logged/stored error bodies to prevent flooding.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Truncates a provider error body to a reasonable length. Keeps useful
/// context without letting a large HTML error page reach logs or the
/// record's error message.
fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

/// Explicit configuration for the provider client. Injected at
/// construction; nothing here is read from ambient globals.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API base, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: SecretString,
    /// Model identifier sent with every request.
    pub model: String,
    /// Output size bound, applied identically every call.
    pub max_tokens: u32,
    /// Sampling temperature; kept low for deterministic-leaning output.
    pub temperature: f32,
    /// Transport timeout for a single HTTP exchange.
    pub request_timeout: Duration,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Stateless OpenAI-compatible translation client.
pub struct OpenAiTranslator {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiTranslator {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    fn system_prompt(&self, source_language: &str, target_language: &str) -> String {
        format!(
            "You are a professional translator. Translate the given JSON content from {} to {}. \
             Maintain the exact JSON structure and only translate the text values. \
             Preserve any HTML tags, special formatting, and maintain the professional tone. \
             Return only valid JSON with the same keys but translated values.",
            source_language,
            language_name(target_language)
        )
    }

    fn request_body<'a>(
        &'a self,
        content: &BTreeMap<String, String>,
        source_language: &str,
        target_language: &str,
    ) -> Result<ChatCompletionRequest<'a>, ProviderError> {
        let content_string =
            serde_json::to_string(content).map_err(ProviderError::Serialize)?;

        Ok(ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.system_prompt(source_language, target_language),
                },
                ChatMessage {
                    role: "user",
                    content: content_string,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        })
    }
}

/// Decodes a chat-completion response body into the translated field map.
///
/// Fails distinctly per layer: a body that is not JSON at all, an envelope
/// without `choices[0].message.content`, and completion text that is not a
/// JSON object of strings are three different errors.
fn parse_translation_response(body: &str) -> Result<BTreeMap<String, String>, ProviderError> {
    let envelope: ChatCompletionResponse =
        serde_json::from_str(body).map_err(ProviderError::Envelope)?;

    let content = envelope
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or(ProviderError::MissingContent)?;

    serde_json::from_str(&content).map_err(ProviderError::InvalidContentJson)
}

#[async_trait]
impl TranslationProvider for OpenAiTranslator {
    async fn translate(
        &self,
        content: &BTreeMap<String, String>,
        source_language: &str,
        target_language: &str,
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        let body = self.request_body(content, source_language, target_language)?;
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        parse_translation_response(&text)
    }
}
