//! HTTP server exposing the chat orchestrator to the web UI

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use persona_rag::{ChatMessage, ChatRole, ConversationOrchestrator, ConversationResponse};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;

const MISSING_MESSAGES: &str = "Messages array is required";
const INVALID_MESSAGE: &str =
    "Invalid message format. Each message must have role and content properties.";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConversationOrchestrator>,
}

/// Parse `{ "messages": [...] }` into a transcript, rejecting anything the
/// orchestrator should never see.
fn parse_transcript(body: &[u8]) -> Result<Vec<ChatMessage>, ApiError> {
    let payload: Value = serde_json::from_slice(body).map_err(|_| bad_request(MISSING_MESSAGES))?;
    let entries = payload
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| bad_request(MISSING_MESSAGES))?;

    entries
        .iter()
        .map(|entry| {
            let role = entry.get("role").and_then(Value::as_str).filter(|r| !r.is_empty());
            let content = entry.get("content").and_then(Value::as_str).filter(|c| !c.is_empty());
            match (role.and_then(ChatRole::parse), content) {
                (Some(role), Some(content)) => Ok(ChatMessage {
                    role,
                    content: content.to_string(),
                }),
                _ => Err(bad_request(INVALID_MESSAGE)),
            }
        })
        .collect()
}

async fn handle_chat(
    AxumState(state): AxumState<AppState>,
    body: Bytes,
) -> Result<Json<ConversationResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("chat", request_id = %request_id);

    async move {
        let messages = parse_transcript(&body).map_err(|e| {
            tracing::warn!(error = %e.1.error, "Rejected chat request");
            e
        })?;
        tracing::info!(messages = messages.len(), "Received chat request");

        let response = state.orchestrator.process(&messages).await;
        tracing::info!(
            intent = ?response.intent,
            action = response.action.is_some(),
            "Sent chat response"
        );
        Ok::<_, ApiError>(Json(response))
    }
    .instrument(span)
    .await
}

async fn health_check() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(handle_chat))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(orchestrator: ConversationOrchestrator, addr: &str) -> anyhow::Result<()> {
    let app = router(AppState {
        orchestrator: Arc::new(orchestrator),
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Persona chat API listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
