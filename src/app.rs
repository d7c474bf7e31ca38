use crate::domain::error::Result;
use crate::infrastructure::config::{AppSettings, ConfigService};
use crate::infrastructure::llm_clients::RouterClient;
use crate::interfaces::http::{add_log, start_server, AppState, LogEntry};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

pub async fn run() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let settings = AppSettings::load()?;
    let host = settings.server.host.clone();
    let port = settings.server.port;
    tracing::info!(provider = settings.provider.id(), "default provider");

    let config_service = Arc::new(ConfigService::new(settings));
    let state = Arc::new(AppState::new(
        config_service.clone(),
        config_service,
        Arc::new(RouterClient::new()),
    ));
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let server = start_server(state, logs.clone(), &host, port)?;
    add_log(
        &logs,
        "INFO",
        "System",
        &format!("HTTP server started on {}:{}", host, port),
    );

    server.await?;
    Ok(())
}
