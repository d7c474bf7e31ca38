use super::{require_api_key, send_for_json, vendor_error, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiModelsResponse {
    models: Option<Vec<GeminiModelInfo>>,
}

#[derive(Deserialize)]
struct GeminiModelInfo {
    name: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Accepts both `gemini-2.5-pro` and `models/gemini-2.5-pro`.
    fn normalize_model(model: &str) -> &str {
        let trimmed = model.trim();
        trimmed.strip_prefix("models/").unwrap_or(trimmed)
    }

    fn endpoint(config: &LLMConfig, suffix: &str, api_key: &str) -> Result<Url> {
        let raw = format!("{}{}", config.base_url.trim_end_matches('/'), suffix);
        let mut url = Url::parse(&raw)
            .map_err(|e| AppError::ValidationError(format!("Invalid Gemini base URL {}: {}", raw, e)))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }
}

fn request_body(config: &LLMConfig, system: &str, user: &str) -> GeminiRequest {
    let parts = [system, user]
        .into_iter()
        .filter(|text| !text.trim().is_empty())
        .map(|text| GeminiPart { text: text.to_string() })
        .collect();

    GeminiRequest {
        contents: vec![GeminiContent { parts }],
        generation_config: GenerationConfig {
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_output_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        },
    }
}

fn extract_text(response: GeminiResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        let api_key = require_api_key(config)?;
        let model_id = Self::normalize_model(&config.model);
        let url = Self::endpoint(config, &format!("/{}:generateContent", model_id), api_key)?;
        let body = request_body(config, system, user);

        tracing::debug!(provider = config.provider.id(), model = model_id, "sending generateContent");
        let request = self.client.post(url).json(&body);
        let json = send_for_json(config.provider, request).await?;

        let response: GeminiResponse = serde_json::from_value(json)
            .map_err(|e| vendor_error(config.provider, format!("unexpected response shape: {}", e)))?;

        extract_text(response).ok_or_else(|| vendor_error(config.provider, "response did not contain candidate text"))
    }

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
        let api_key = require_api_key(config)?;
        let url = Self::endpoint(config, "", api_key)?;

        let json = send_for_json(config.provider, self.client.get(url)).await?;
        let response: GeminiModelsResponse = serde_json::from_value(json)
            .map_err(|e| vendor_error(config.provider, format!("unexpected models response: {}", e)))?;

        let models = response
            .models
            .unwrap_or_default()
            .into_iter()
            .map(|model| Self::normalize_model(&model.name).to_string())
            .collect();

        Ok(models)
    }
}
