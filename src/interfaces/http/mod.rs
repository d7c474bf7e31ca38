use crate::application::use_cases::export::{render, ExportFormat};
use crate::application::use_cases::generate::{ApiKeyStore, GenerateScenariosUseCase, SettingsReader};
use crate::application::use_cases::normalizer::normalize_traced;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use crate::domain::test_scenario::ResultSet;
use crate::infrastructure::llm_clients::LLMClient;
use actix_cors::Cors;
use actix_web::http::{header, StatusCode};
use actix_web::{delete, dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct AppState {
    pub settings: Arc<dyn SettingsReader + Send + Sync>,
    pub api_keys: Arc<dyn ApiKeyStore + Send + Sync>,
    pub llm_client: Arc<dyn LLMClient + Send + Sync>,
    pub generate_use_case: GenerateScenariosUseCase,
}

impl AppState {
    pub fn new(
        settings: Arc<dyn SettingsReader + Send + Sync>,
        api_keys: Arc<dyn ApiKeyStore + Send + Sync>,
        llm_client: Arc<dyn LLMClient + Send + Sync>,
    ) -> Self {
        Self {
            settings,
            api_keys,
            generate_use_case: GenerateScenariosUseCase::new(llm_client.clone()),
            llm_client,
        }
    }

    /// Stored configuration for `provider` with the request's non-blank overrides applied.
    fn resolve_config(
        &self,
        provider: &str,
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Result<LLMConfig> {
        let provider: LLMProvider = provider.parse()?;
        Ok(self
            .settings
            .llm_config(Some(provider))?
            .with_api_key(api_key)
            .with_model(model)
            .with_base_url(base_url))
    }
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Scraped page JSON (as a string or an object) or free text.
    pub content: Value,
    pub provider: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl GenerateRequest {
    fn content_text(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct NormalizeRequest {
    pub raw: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsRequest {
    pub provider: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveApiKeyRequest {
    pub provider: String,
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct ProviderQuery {
    pub provider: String,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::ValidationError(_) | AppError::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
        AppError::VendorError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(logs: &Mutex<Vec<LogEntry>>, context: &str, err: &AppError) -> HttpResponse {
    add_log(logs, "ERROR", "HttpApi", &format!("{}: {}", context, err));
    HttpResponse::build(status_for(err)).json(json!({
        "success": false,
        "error": err.to_string(),
    }))
}

#[get("/ping")]
async fn ping() -> impl Responder {
    HttpResponse::Ok().json(json!({ "success": true, "message": "pong" }))
}

#[post("/scenarios/generate")]
async fn generate_scenarios(data: web::Data<HttpState>, req: web::Json<GenerateRequest>) -> impl Responder {
    let req = req.into_inner();
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Generating scenarios (provider={})", req.provider.trim()),
    );

    let content = req.content_text();
    let config = match data
        .app_state
        .resolve_config(&req.provider, req.api_key, req.model, req.base_url)
    {
        Ok(config) => config,
        Err(e) => return error_response(&data.logs, "Generation rejected", &e),
    };

    match data.app_state.generate_use_case.execute(&config, &content).await {
        Ok(report) => {
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!(
                    "Generated {} scenarios (run={} model={})",
                    report.result.len(),
                    report.run_id,
                    report.model
                ),
            );
            HttpResponse::Ok().json(report)
        }
        Err(e) => error_response(&data.logs, "Generation failed", &e),
    }
}

#[post("/scenarios/normalize")]
async fn normalize_response(req: web::Json<NormalizeRequest>) -> impl Responder {
    HttpResponse::Ok().json(normalize_traced(&req.raw))
}

#[post("/scenarios/export")]
async fn export_scenarios(
    data: web::Data<HttpState>,
    query: web::Query<ExportQuery>,
    result: web::Json<ResultSet>,
) -> impl Responder {
    let rendered = ExportFormat::parse(query.format.as_deref().unwrap_or("json"))
        .and_then(|format| render(&result, format).map(|body| (format, body)));

    match rendered {
        Ok((format, body)) => HttpResponse::Ok()
            .content_type(format.content_type())
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ))
            .body(body),
        Err(e) => error_response(&data.logs, "Export failed", &e),
    }
}

#[post("/models")]
async fn list_models(data: web::Data<HttpState>, req: web::Json<ModelsRequest>) -> impl Responder {
    let req = req.into_inner();
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Fetching models (provider={})", req.provider.trim()),
    );

    let config = match data
        .app_state
        .resolve_config(&req.provider, req.api_key, None, req.base_url)
    {
        Ok(config) => config,
        Err(e) => return error_response(&data.logs, "Model listing rejected", &e),
    };

    match data.app_state.llm_client.list_models(&config).await {
        Ok(models) => HttpResponse::Ok().json(models),
        Err(e) => error_response(&data.logs, "Failed to list models", &e),
    }
}

#[post("/settings/api-key")]
async fn save_api_key(data: web::Data<HttpState>, req: web::Json<SaveApiKeyRequest>) -> impl Responder {
    let saved = req
        .provider
        .parse::<LLMProvider>()
        .and_then(|provider| data.app_state.api_keys.save_api_key(provider, &req.api_key).map(|_| provider));

    match saved {
        Ok(provider) => {
            add_log(&data.logs, "INFO", "HttpApi", &format!("API key saved (provider={})", provider));
            HttpResponse::Ok().json(json!({ "success": true }))
        }
        Err(e) => error_response(&data.logs, "Failed to save API key", &e),
    }
}

#[delete("/settings/api-key")]
async fn delete_api_key(data: web::Data<HttpState>, query: web::Query<ProviderQuery>) -> impl Responder {
    let deleted = query
        .provider
        .parse::<LLMProvider>()
        .and_then(|provider| data.app_state.api_keys.delete_api_key(provider).map(|_| provider));

    match deleted {
        Ok(provider) => {
            add_log(&data.logs, "INFO", "HttpApi", &format!("API key deleted (provider={})", provider));
            HttpResponse::Ok().json(json!({ "success": true }))
        }
        Err(e) => error_response(&data.logs, "Failed to delete API key", &e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    HttpResponse::Ok().json(&*logs)
}

pub fn add_log_entry(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

/// Records `message` in the ring and mirrors it to the tracing subscriber.
pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }
    add_log_entry(logs, level, source, message);
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(ping)
            .service(generate_scenarios)
            .service(normalize_response)
            .service(export_scenarios)
            .service(list_models)
            .service(save_api_key)
            .service(delete_api_key)
            .service(get_logs),
    );
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    host: &str,
    port: u16,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState { app_state, logs });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // the extension calls from its own origin

        App::new().wrap(cors).app_data(state.clone()).configure(routes)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use async_trait::async_trait;

    struct CannedClient {
        reply: Result<String>,
    }

    #[async_trait]
    impl LLMClient for CannedClient {
        async fn generate(&self, _config: &LLMConfig, _system: &str, _user: &str) -> Result<String> {
            self.reply.clone()
        }

        async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
            Ok(vec![config.model.clone()])
        }
    }

    struct DefaultSettings;

    impl SettingsReader for DefaultSettings {
        fn llm_config(&self, provider: Option<LLMProvider>) -> Result<LLMConfig> {
            Ok(LLMConfig::for_provider(provider.unwrap_or(LLMProvider::OpenAI)))
        }
    }

    /// Records writes; `fail_with` makes every write fail.
    #[derive(Default)]
    struct RecordingKeys {
        saved: Mutex<Vec<(LLMProvider, String)>>,
        deleted: Mutex<Vec<LLMProvider>>,
        fail_with: Option<AppError>,
    }

    impl ApiKeyStore for RecordingKeys {
        fn save_api_key(&self, provider: LLMProvider, key: &str) -> Result<()> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.saved.lock().unwrap().push((provider, key.to_string()));
            Ok(())
        }

        fn delete_api_key(&self, provider: LLMProvider) -> Result<()> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.deleted.lock().unwrap().push(provider);
            Ok(())
        }
    }

    fn state(reply: Result<String>) -> web::Data<HttpState> {
        state_with_keys(reply, Arc::new(RecordingKeys::default()))
    }

    fn state_with_keys(reply: Result<String>, keys: Arc<RecordingKeys>) -> web::Data<HttpState> {
        let app_state = AppState::new(Arc::new(DefaultSettings), keys, Arc::new(CannedClient { reply }));
        web::Data::new(HttpState {
            app_state: Arc::new(app_state),
            logs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    #[actix_web::test]
    async fn ping_answers_pong() {
        let app = test::init_service(App::new().app_data(state(Ok(String::new()))).configure(routes)).await;
        let req = test::TestRequest::get().uri("/api/ping").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "pong");
    }

    #[actix_web::test]
    async fn generate_returns_normalized_report() {
        let reply = r#"{"testScenarios": [{"testCaseID": "TS001", "testObjective": "Login", "priority": "High"}]}"#;
        let data = state(Ok(reply.to_string()));
        let app = test::init_service(App::new().app_data(data.clone()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/scenarios/generate")
            .set_json(json!({
                "content": {"documentType": {"type": "web_application"}, "title": "Login"},
                "provider": "deepseek",
                "model": "deepseek-reasoner"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["provider"], "deepseek");
        assert_eq!(body["model"], "deepseek-reasoner");
        assert_eq!(body["stage"], "direct");
        assert_eq!(body["result"]["summary"]["priorityBreakdown"]["high"], 1);
        assert!(!data.logs.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn unknown_provider_is_a_bad_request() {
        let app = test::init_service(App::new().app_data(state(Ok(String::new()))).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/scenarios/generate")
            .set_json(json!({"content": "text", "provider": "claude"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Unsupported API provider: claude");
    }

    #[actix_web::test]
    async fn vendor_failure_maps_to_bad_gateway() {
        let failure = AppError::VendorError("Gemini API error: API key not valid".to_string());
        let app = test::init_service(App::new().app_data(state(Err(failure))).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/scenarios/generate")
            .set_json(json!({"content": "text", "provider": "gemini"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Gemini API error: API key not valid");
    }

    #[actix_web::test]
    async fn normalize_exposes_the_trace() {
        let app = test::init_service(App::new().app_data(state(Ok(String::new()))).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/scenarios/normalize")
            .set_json(json!({"raw": "1. Check login\nShould succeed"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["trace"]["accepted"], "line_scan");
        assert_eq!(body["result"]["testScenarios"][0]["testObjective"], "Check login");
    }

    #[actix_web::test]
    async fn export_sets_attachment_name() {
        let app = test::init_service(App::new().app_data(state(Ok(String::new()))).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/scenarios/export?format=csv")
            .set_json(json!({"testScenarios": [{"testCaseID": "TS001", "testObjective": "Login"}]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"test_scenarios.csv\""
        );

        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with("Test Case ID,"));
        assert!(text.contains("TS001,Login"));
    }

    #[actix_web::test]
    async fn export_rejects_unknown_format() {
        let app = test::init_service(App::new().app_data(state(Ok(String::new()))).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/scenarios/export?format=xlsx")
            .set_json(json!({"testScenarios": []}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn models_use_the_stored_default_model() {
        let app = test::init_service(App::new().app_data(state(Ok(String::new()))).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/models")
            .set_json(json!({"provider": "openai", "apiKey": "sk"}))
            .to_request();
        let body: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, vec!["gpt-3.5-turbo"]);
    }

    #[actix_web::test]
    async fn api_key_is_saved_for_the_named_provider() {
        let keys = Arc::new(RecordingKeys::default());
        let app = test::init_service(
            App::new()
                .app_data(state_with_keys(Ok(String::new()), keys.clone()))
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/settings/api-key")
            .set_json(json!({"provider": "Gemini", "apiKey": "g-key"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(*keys.saved.lock().unwrap(), vec![(LLMProvider::Gemini, "g-key".to_string())]);
    }

    #[actix_web::test]
    async fn api_key_is_deleted_by_query_provider() {
        let keys = Arc::new(RecordingKeys::default());
        let app = test::init_service(
            App::new()
                .app_data(state_with_keys(Ok(String::new()), keys.clone()))
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::delete()
            .uri("/api/settings/api-key?provider=deepseek")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(*keys.deleted.lock().unwrap(), vec![LLMProvider::DeepSeek]);
    }

    #[actix_web::test]
    async fn api_key_writes_reject_unknown_providers() {
        let keys = Arc::new(RecordingKeys::default());
        let app = test::init_service(
            App::new()
                .app_data(state_with_keys(Ok(String::new()), keys.clone()))
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/settings/api-key")
            .set_json(json!({"provider": "claude", "apiKey": "k"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(keys.saved.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn keyring_failure_is_reported() {
        let keys = Arc::new(RecordingKeys {
            fail_with: Some(AppError::SecurityError("Failed to set password: locked".to_string())),
            ..RecordingKeys::default()
        });
        let app = test::init_service(
            App::new()
                .app_data(state_with_keys(Ok(String::new()), keys))
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/settings/api-key")
            .set_json(json!({"provider": "openai", "apiKey": "sk"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Security error: Failed to set password: locked");
    }

    #[actix_web::test]
    async fn log_ring_keeps_the_latest_entries() {
        let logs = Mutex::new(Vec::new());
        for n in 0..(MAX_LOG_ENTRIES + 5) {
            add_log_entry(&logs, "INFO", "Test", &format!("entry {}", n));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }
}
