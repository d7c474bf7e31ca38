pub mod gemini;
pub mod openai_compatible;

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::llm_config::LLMProvider;
use async_trait::async_trait;
use gemini::GeminiClient;
use openai_compatible::OpenAICompatibleClient;
use reqwest::StatusCode;
use serde_json::Value;

#[async_trait]
pub trait LLMClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String>;
    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>>;
}

/// Dispatches on `config.provider`. OpenAI and DeepSeek share the
/// chat-completions envelope.
pub struct RouterClient {
    openai: OpenAICompatibleClient,
    gemini: GeminiClient,
}

impl RouterClient {
    pub fn new() -> Self {
        Self {
            openai: OpenAICompatibleClient::new(),
            gemini: GeminiClient::new(),
        }
    }
}

#[async_trait]
impl LLMClient for RouterClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        match config.provider {
            LLMProvider::Gemini => self.gemini.generate(config, system, user).await,
            LLMProvider::OpenAI | LLMProvider::DeepSeek => self.openai.generate(config, system, user).await,
        }
    }

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
        match config.provider {
            LLMProvider::Gemini => self.gemini.list_models(config).await,
            LLMProvider::OpenAI | LLMProvider::DeepSeek => self.openai.list_models(config).await,
        }
    }
}

/// `"<Vendor> API error: <detail>"`
pub(crate) fn vendor_error(provider: LLMProvider, detail: impl std::fmt::Display) -> AppError {
    AppError::VendorError(format!("{} API error: {}", provider.label(), detail))
}

pub(crate) fn require_api_key(config: &LLMConfig) -> Result<&str> {
    config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| vendor_error(config.provider, "API key is missing"))
}

/// Sends one request and decodes the JSON body of a successful response.
pub(crate) async fn send_for_json(provider: LLMProvider, request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| vendor_error(provider, format!("request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| vendor_error(provider, format!("failed to read response: {}", e)))?;

    if !status.is_success() {
        tracing::warn!(provider = provider.id(), status = status.as_u16(), "vendor request failed");
        return Err(vendor_error(provider, describe_failure(status, &body)));
    }

    serde_json::from_str(&body).map_err(|e| vendor_error(provider, format!("invalid JSON response: {}", e)))
}

/// The vendor's own description of a failed call, else the HTTP reason.
pub(crate) fn describe_failure(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| embedded_error_message(&value))
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

// Gemini sometimes wraps the error object in a one-element array.
fn embedded_error_message(value: &Value) -> Option<String> {
    let value = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };

    let non_blank = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    value
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(non_blank)
        .or_else(|| value.get("message").and_then(non_blank))
        .or_else(|| value.get("error").and_then(non_blank))
}
