use super::{require_api_key, send_for_json, vendor_error, LLMClient};
use crate::domain::error::Result;
use crate::domain::llm_config::{LLMConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Chat-completions client used for OpenAI and DeepSeek.
pub struct OpenAICompatibleClient {
    client: reqwest::Client,
}

impl OpenAICompatibleClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(config: &LLMConfig, path: &str) -> String {
        format!("{}/{}", config.base_url.trim_end_matches('/'), path)
    }
}

pub(crate) fn request_body(config: &LLMConfig, system: &str, user: &str) -> Value {
    json!({
        "model": config.model,
        "messages": [
            {
                "role": "system",
                "content": system
            },
            {
                "role": "user",
                "content": user
            }
        ],
        "temperature": config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        "max_tokens": config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    })
}

pub(crate) fn extract_text(response: &Value) -> Option<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        let api_key = require_api_key(config)?;
        let url = Self::endpoint(config, "chat/completions");
        let body = request_body(config, system, user);

        tracing::debug!(provider = config.provider.id(), model = %config.model, "sending chat completion");
        let request = self.client.post(&url).bearer_auth(api_key).json(&body);
        let json = send_for_json(config.provider, request).await?;

        extract_text(&json).ok_or_else(|| vendor_error(config.provider, "response did not contain message content"))
    }

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
        let api_key = require_api_key(config)?;
        let url = Self::endpoint(config, "models");

        let request = self.client.get(&url).bearer_auth(api_key);
        let json = send_for_json(config.provider, request).await?;

        let models = json["data"]
            .as_array()
            .ok_or_else(|| vendor_error(config.provider, "missing data array in models response"))?
            .iter()
            .filter_map(|m| m["id"].as_str())
            .map(|id| id.to_string())
            .collect();

        Ok(models)
    }
}
