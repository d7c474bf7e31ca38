use crate::domain::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Gemini,
    DeepSeek,
}

impl LLMProvider {
    pub const ALL: [LLMProvider; 3] = [LLMProvider::OpenAI, LLMProvider::Gemini, LLMProvider::DeepSeek];

    pub fn id(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "openai",
            LLMProvider::Gemini => "gemini",
            LLMProvider::DeepSeek => "deepseek",
        }
    }

    /// Vendor name used as the prefix of surfaced error messages.
    pub fn label(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "OpenAI",
            LLMProvider::Gemini => "Gemini",
            LLMProvider::DeepSeek => "DeepSeek",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta/models",
            LLMProvider::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "gpt-3.5-turbo",
            LLMProvider::Gemini => "gemini-2.5-pro",
            LLMProvider::DeepSeek => "deepseek-chat",
        }
    }
}

impl fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for LLMProvider {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        LLMProvider::ALL
            .into_iter()
            .find(|provider| provider.id() == normalized)
            .ok_or_else(|| AppError::UnsupportedProvider(value.trim().to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LLMConfig {
    pub fn for_provider(provider: LLMProvider) -> Self {
        Self {
            provider,
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            api_key: None,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: Some(DEFAULT_TEMPERATURE),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.map(|key| key.trim().to_string()) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model.map(|model| model.trim().to_string()) {
            if !model.is_empty() {
                self.model = model;
            }
        }
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(base_url) = base_url.map(|url| url.trim().to_string()) {
            if !base_url.is_empty() {
                self.base_url = base_url;
            }
        }
        self
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self::for_provider(LLMProvider::OpenAI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_provider_ids_case_insensitively() {
        assert_eq!("openai".parse::<LLMProvider>().unwrap(), LLMProvider::OpenAI);
        assert_eq!(" Gemini ".parse::<LLMProvider>().unwrap(), LLMProvider::Gemini);
        assert_eq!("DEEPSEEK".parse::<LLMProvider>().unwrap(), LLMProvider::DeepSeek);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = "anthropic".parse::<LLMProvider>().unwrap_err();
        assert_eq!(err, AppError::UnsupportedProvider("anthropic".to_string()));
    }

    #[test]
    fn provider_serializes_as_its_id() {
        let json = serde_json::to_string(&LLMProvider::DeepSeek).unwrap();
        assert_eq!(json, "\"deepseek\"");
        let back: LLMProvider = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(back, LLMProvider::OpenAI);
    }

    #[test]
    fn blank_overrides_keep_defaults() {
        let config = LLMConfig::for_provider(LLMProvider::Gemini)
            .with_model(Some("  ".to_string()))
            .with_api_key(Some(String::new()));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn validation_rejects_empty_model_and_bad_url() {
        let mut config = LLMConfig::default();
        assert!(config.validate().is_ok());
        config.model.clear();
        config.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
