use crate::application::use_cases::normalizer::{normalize_traced, Stage};
use crate::application::use_cases::prompt_builder::{PromptBuilder, SYSTEM_PROMPT};
use crate::domain::error::Result;
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use crate::domain::test_scenario::ResultSet;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::strip_reasoning;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Resolves the provider configuration (endpoint, model, credential) for a run.
pub trait SettingsReader {
    /// `None` selects the configured default provider.
    fn llm_config(&self, provider: Option<LLMProvider>) -> Result<LLMConfig>;
}

/// Persists provider credentials written through the settings surface.
pub trait ApiKeyStore {
    fn save_api_key(&self, provider: LLMProvider, key: &str) -> Result<()>;
    /// Removing a key that was never stored succeeds.
    fn delete_api_key(&self, provider: LLMProvider) -> Result<()>;
}

/// Source of the text a run analyzes.
#[async_trait]
pub trait ContentSupplier {
    async fn content(&self) -> Result<String>;
}

/// Content handed over directly, e.g. the scraper's JSON.
pub struct InlineContent(pub String);

#[async_trait]
impl ContentSupplier for InlineContent {
    async fn content(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub provider: LLMProvider,
    pub model: String,
    pub generated_at: DateTime<Utc>,
    /// Normalizer stage that produced the scenarios, `None` for an empty result.
    pub stage: Option<Stage>,
    pub result: ResultSet,
}

pub struct GenerateScenariosUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    prompt_builder: PromptBuilder,
}

impl GenerateScenariosUseCase {
    pub fn new(llm_client: Arc<dyn LLMClient + Send + Sync>) -> Self {
        Self {
            llm_client,
            prompt_builder: PromptBuilder::default(),
        }
    }

    pub async fn execute(&self, config: &LLMConfig, content: &str) -> Result<GenerationReport> {
        config.validate()?;

        let run_id = Uuid::new_v4();
        let prompt = self.prompt_builder.build_from_raw(content);
        tracing::info!(
            run_id = %run_id,
            provider = config.provider.id(),
            model = %config.model,
            prompt_chars = prompt.chars().count(),
            "generating test scenarios"
        );

        let raw = self.llm_client.generate(config, SYSTEM_PROMPT, &prompt).await?;
        let normalized = normalize_traced(&strip_reasoning(&raw));

        tracing::info!(
            run_id = %run_id,
            total = normalized.result.summary().total,
            stage = normalized.trace.accepted.map(|stage| stage.label()).unwrap_or("none"),
            "test scenarios normalized"
        );

        Ok(GenerationReport {
            run_id,
            provider: config.provider,
            model: config.model.clone(),
            generated_at: Utc::now(),
            stage: normalized.trace.accepted,
            result: normalized.result,
        })
    }

    /// Resolves settings and content through the collaborators, then runs [`Self::execute`].
    pub async fn run(
        &self,
        settings: &(dyn SettingsReader + Send + Sync),
        provider: Option<LLMProvider>,
        supplier: &(dyn ContentSupplier + Send + Sync),
    ) -> Result<GenerationReport> {
        let config = settings.llm_config(provider)?;
        let content = supplier.content().await?;
        self.execute(&config, &content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Result<String>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedClient {
        fn new(reply: Result<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMClient for ScriptedClient {
        async fn generate(&self, _config: &LLMConfig, system: &str, user: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            self.reply.clone()
        }

        async fn list_models(&self, _config: &LLMConfig) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct FixedSettings;

    impl SettingsReader for FixedSettings {
        fn llm_config(&self, provider: Option<LLMProvider>) -> Result<LLMConfig> {
            Ok(LLMConfig::for_provider(provider.unwrap_or(LLMProvider::OpenAI)).with_api_key(Some("key".to_string())))
        }
    }

    #[tokio::test]
    async fn runs_prompt_through_client_and_normalizer() {
        let client = ScriptedClient::new(Ok(
            r#"<think>draft</think>{"testScenarios": [{"testCaseID": "TS001", "testObjective": "Login"}]}"#.to_string(),
        ));
        let use_case = GenerateScenariosUseCase::new(client.clone());

        let report = use_case
            .run(&FixedSettings, Some(LLMProvider::Gemini), &InlineContent("Login page".to_string()))
            .await
            .unwrap();

        assert_eq!(report.provider, LLMProvider::Gemini);
        assert_eq!(report.model, "gemini-2.5-pro");
        assert_eq!(report.stage, Some(Stage::Direct));
        assert_eq!(report.result.summary().total, 1);

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts[0].0, SYSTEM_PROMPT);
        assert!(prompts[0].1.contains("Main Content:\nLogin page"));
    }

    #[tokio::test]
    async fn unparseable_reply_is_an_empty_report() {
        let client = ScriptedClient::new(Ok("I cannot help with that.".to_string()));
        let report = GenerateScenariosUseCase::new(client)
            .execute(&LLMConfig::default(), "content")
            .await
            .unwrap();

        assert!(report.result.is_empty());
        assert_eq!(report.stage, None);
    }

    #[tokio::test]
    async fn vendor_errors_propagate() {
        let client = ScriptedClient::new(Err(AppError::VendorError("OpenAI API error: quota".to_string())));
        let err = GenerateScenariosUseCase::new(client)
            .execute(&LLMConfig::default(), "content")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API error: quota");
    }

    #[tokio::test]
    async fn invalid_config_fails_before_the_vendor_call() {
        let client = ScriptedClient::new(Ok(String::new()));
        let mut config = LLMConfig::default();
        config.model.clear();

        let err = GenerateScenariosUseCase::new(client.clone())
            .execute(&config, "content")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = GenerationReport {
            run_id: Uuid::nil(),
            provider: LLMProvider::DeepSeek,
            model: "deepseek-chat".to_string(),
            generated_at: Utc::now(),
            stage: Some(Stage::FieldScan),
            result: ResultSet::empty(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["provider"], "deepseek");
        assert_eq!(value["stage"], "field_scan");
        assert!(value.get("runId").is_some());
        assert_eq!(value["result"]["summary"]["totalScenarios"], 0);
    }
}
