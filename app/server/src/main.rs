mod chat_http_server;

use anyhow::{anyhow, Result};
use persona_rag::{ConversationOrchestrator, PersonaRagConfig};
use std::path::Path;

fn load_config() -> Result<PersonaRagConfig> {
    match std::env::var("PERSONA_RAG_CONFIG") {
        Ok(path) => {
            tracing::info!(path = %path, "Loading config file");
            PersonaRagConfig::from_file(Path::new(&path)).map_err(|e| anyhow!(e))
        }
        Err(_) => PersonaRagConfig::from_env().map_err(|e| anyhow!(e)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = load_config()?;
    tracing::info!(
        subject = %config.persona.subject_name,
        top_k = config.search.top_k,
        policy = ?config.persona.empty_context_policy,
        restrict_to_subject = config.persona.restrict_to_subject,
        "Configuration loaded"
    );

    let orchestrator = ConversationOrchestrator::from_config(&config)?;

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    chat_http_server::start_server(orchestrator, &addr).await
}
