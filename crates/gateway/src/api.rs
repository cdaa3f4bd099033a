//! JSON API handlers.
//!
//! Endpoints:
//! - `GET  /health`            — liveness and which keys are configured
//! - `POST /api/chat`          — one user message through the agent loop
//! - `POST /api/clear`         — forget a conversation
//! - `GET  /api/tasks`         — recent remote tasks
//! - `GET  /api/tasks/{tid}`   — one remote task
//! - `GET  /api/account`       — remote account info

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

use seomagic_agent::{AgentLoop, ToolCallRecord};
use seomagic_core::error::{ErrorKind, ToolError};
use seomagic_core::message::ConversationId;
use seomagic_core::store::ConversationStore;
use seomagic_tools::TaskToolkit;

use crate::{GatewayState, SharedState};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            kind,
        }),
    )
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn tool_failure(e: ToolError) -> ApiError {
    api_error(status_for(e.kind), e.kind, e.message)
}

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/clear", post(clear_handler))
        .route("/api/tasks", get(list_tasks_handler))
        .route("/api/tasks/{tid}", get(get_task_handler))
        .route("/api/account", get(account_handler))
}

// ── Helpers ───────────────────────────────────────────────────────────────

impl GatewayState {
    fn require_agent(&self) -> Result<&Arc<AgentLoop>, ApiError> {
        if !self.config.has_model_key() {
            return Err(not_configured("ANTHROPIC_API_KEY"));
        }
        self.agent
            .as_ref()
            .ok_or_else(|| not_configured("JUSTMAGIC_API_KEY"))
    }

    fn require_toolkit(&self) -> Result<&Arc<TaskToolkit>, ApiError> {
        self.toolkit
            .as_ref()
            .ok_or_else(|| not_configured("JUSTMAGIC_API_KEY"))
    }
}

fn not_configured(what: &str) -> ApiError {
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::InternalError,
        format!("{what} not configured"),
    )
}

// ── Handlers ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: String,
    anthropic_configured: bool,
    justmagic_configured: bool,
    telegram_configured: bool,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        anthropic_configured: state.config.has_model_key(),
        justmagic_configured: state.config.has_remote_key(),
        telegram_configured: state
            .config
            .telegram_bot_token
            .as_deref()
            .is_some_and(|t| !t.is_empty()),
    })
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub tool_calls: Option<Vec<ToolCallRecord>>,
    pub conversation_id: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    let agent = state.require_agent()?;

    if payload.message.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            ErrorKind::SchemaError,
            "message must not be empty",
        ));
    }

    let conversation_id = match payload.conversation_id.filter(|id| !id.is_empty()) {
        Some(id) => ConversationId::from(id),
        None => ConversationId::generate(payload.user_id.as_deref()),
    };
    info!(conversation_id = %conversation_id, "Chat request");

    match agent.run(&conversation_id, &payload.message).await {
        Ok(outcome) => Ok(Json(ChatResponse {
            response: outcome.response,
            tool_calls: (!outcome.tool_calls.is_empty()).then_some(outcome.tool_calls),
            conversation_id: outcome.conversation_id.to_string(),
        })),
        Err(e) => {
            error!(conversation_id = %conversation_id, error = %e, "Chat failed");
            let kind = e.kind();
            Err(api_error(status_for(kind), kind, e.public_message()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClearParams {
    conversation_id: String,
}

async fn clear_handler(
    State(state): State<SharedState>,
    Query(params): Query<ClearParams>,
) -> ApiResult<Value> {
    let id = ConversationId::from(params.conversation_id);
    let cleared = match &state.agent {
        Some(agent) => agent.clear(&id).await,
        None => state.store.clear(&id).await.map_err(seomagic_core::Error::from),
    };
    match cleared {
        Ok(existed) => {
            info!(conversation_id = %id, existed, "Conversation cleared");
            Ok(Json(json!({"status": "ok"})))
        }
        Err(e) => Err(api_error(status_for(e.kind()), e.kind(), e.public_message())),
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    10
}

async fn list_tasks_handler(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Value> {
    let toolkit = state.require_toolkit()?;
    toolkit
        .call("justmagic_list_tasks", &json!({"limit": params.limit}))
        .await
        .map(Json)
        .map_err(tool_failure)
}

async fn get_task_handler(
    State(state): State<SharedState>,
    Path(tid): Path<i64>,
) -> ApiResult<Value> {
    let toolkit = state.require_toolkit()?;
    toolkit
        .call("justmagic_get_task", &json!({"tid": tid, "mode": "info"}))
        .await
        .map(Json)
        .map_err(tool_failure)
}

async fn account_handler(State(state): State<SharedState>) -> ApiResult<Value> {
    let toolkit = state.require_toolkit()?;
    toolkit
        .call("justmagic_info", &json!({}))
        .await
        .map(Json)
        .map_err(tool_failure)
}
