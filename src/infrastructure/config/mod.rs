use crate::application::use_cases::generate::{ApiKeyStore, SettingsReader};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::infrastructure::security::keyring::KeyringManager;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const KEYRING_SERVICE: &str = "scenariogen";
pub const ENV_PREFIX: &str = "SCENARIOGEN_";
pub const CONFIG_PATH_VAR: &str = "SCENARIOGEN_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "scenariogen.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderSettings {
    fn defaults_for(provider: LLMProvider) -> Self {
        Self {
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub provider: LLMProvider,
    pub server: ServerSettings,
    pub temperature: f32,
    pub max_tokens: u32,
    pub openai: ProviderSettings,
    pub gemini: ProviderSettings,
    pub deepseek: ProviderSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            server: ServerSettings::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            openai: ProviderSettings::defaults_for(LLMProvider::OpenAI),
            gemini: ProviderSettings::defaults_for(LLMProvider::Gemini),
            deepseek: ProviderSettings::defaults_for(LLMProvider::DeepSeek),
        }
    }
}

impl AppSettings {
    /// Defaults, then `config_file` if it exists, then `SCENARIOGEN_*` variables
    /// (`SCENARIOGEN_SERVER__PORT=8080` sets `server.port`).
    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppSettings::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
    }

    pub fn load() -> Result<Self> {
        let config_file = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        tracing::debug!(path = %config_file.display(), "loading settings");
        Ok(Self::figment(&config_file).extract()?)
    }

    pub fn provider_settings(&self, provider: LLMProvider) -> &ProviderSettings {
        match provider {
            LLMProvider::OpenAI => &self.openai,
            LLMProvider::Gemini => &self.gemini,
            LLMProvider::DeepSeek => &self.deepseek,
        }
    }
}

pub struct ConfigService {
    settings: AppSettings,
    keyring: KeyringManager,
}

impl ConfigService {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            keyring: KeyringManager::new(KEYRING_SERVICE),
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Key from settings, else from the OS keyring. An unavailable keyring is
    /// logged and treated as "no key"; the vendor client reports the absence.
    fn stored_api_key(&self, provider: LLMProvider) -> Option<String> {
        if let Some(key) = self
            .settings
            .provider_settings(provider)
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
        {
            return Some(key);
        }

        match self.keyring.find_secret(provider.id()) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(provider = provider.id(), error = %e, "keyring lookup failed");
                None
            }
        }
    }
}

impl ApiKeyStore for ConfigService {
    fn save_api_key(&self, provider: LLMProvider, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::ValidationError("API key must not be empty".to_string()));
        }
        self.keyring.set_secret(provider.id(), key)?;
        tracing::info!(provider = provider.id(), "api key stored in keyring");
        Ok(())
    }

    fn delete_api_key(&self, provider: LLMProvider) -> Result<()> {
        self.keyring.delete_secret(provider.id())?;
        tracing::info!(provider = provider.id(), "api key removed from keyring");
        Ok(())
    }
}

impl SettingsReader for ConfigService {
    fn llm_config(&self, provider: Option<LLMProvider>) -> Result<LLMConfig> {
        let provider = provider.unwrap_or(self.settings.provider);
        let section = self.settings.provider_settings(provider);

        let mut config = LLMConfig::for_provider(provider)
            .with_base_url(Some(section.base_url.clone()))
            .with_model(Some(section.model.clone()))
            .with_api_key(self.stored_api_key(provider));
        config.temperature = Some(self.settings.temperature);
        config.max_tokens = Some(self.settings.max_tokens);

        Ok(config)
    }
}
