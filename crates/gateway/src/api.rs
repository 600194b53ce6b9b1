//! Agent HTTP API.
//!
//! Endpoints:
//!
//! - `POST   /api/agent/chat`                    — Run one turn
//! - `GET    /api/agent/conversation/{sessionId}` — Conversation for a session
//! - `DELETE /api/agent/conversation/{sessionId}` — Discard a session
//! - `GET    /api/agent/sessions`                — Active session ids
//! - `GET    /api/agent/logs/{sessionId}`        — Last turn's trace, plain text
//! - `GET    /api/agent/info`                    — Agent name, tools, limits

use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use cardwise_agent::{AGENT_NAME, AgentService};
use cardwise_core::error::Error;
use cardwise_core::message::Conversation;

/// Shown by the logs endpoint before a session has completed a turn.
pub const NO_LOG: &str = "No log for this session yet.";

pub struct ApiState {
    pub agent: Arc<AgentService>,
}

pub type SharedApiState = Arc<ApiState>;

/// Build the agent router. Nest this under `/api/agent`.
pub fn agent_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route(
            "/conversation/{session_id}",
            get(get_conversation_handler).delete(clear_conversation_handler),
        )
        .route("/sessions", get(list_sessions_handler))
        .route("/logs/{session_id}", get(logs_handler))
        .route("/info", get(info_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    /// Omit to start a new session.
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    response: String,
    session_id: String,
    processing_time_ms: u64,
    iterations: usize,
    tool_calls: usize,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearResponse {
    message: String,
    session_id: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionListResponse {
    active_sessions: Vec<String>,
    count: usize,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoResponse {
    name: String,
    model: String,
    tools: Vec<String>,
    max_iterations: usize,
    response_format: String,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Maps service errors and malformed bodies onto status codes.
enum ApiError {
    Agent(Error),
    Body(JsonRejection),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Agent(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Agent(e @ Error::InvalidInput(_)) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Agent(e) => {
                error!(error = %e, "Agent request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::Body(rejection) => (rejection.status(), rejection.body_text()),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload?;
    let session_id = payload
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!(session = %session_id, message_len = payload.message.len(), "Chat request");

    let started = Instant::now();
    let outcome = state.agent.process_turn(&session_id, &payload.message).await?;

    Ok(Json(ChatResponse {
        response: outcome.answer,
        session_id,
        processing_time_ms: started.elapsed().as_millis() as u64,
        iterations: outcome.iterations,
        tool_calls: outcome.tool_calls_made,
    }))
}

async fn get_conversation_handler(
    State(state): State<SharedApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<Conversation>, Response> {
    match state.agent.get_conversation(&session_id).await {
        Ok(Some(conversation)) => Ok(Json(conversation)),
        Ok(None) => Err(StatusCode::NOT_FOUND.into_response()),
        Err(e) => Err(ApiError::Agent(e).into_response()),
    }
}

async fn clear_conversation_handler(
    State(state): State<SharedApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<ClearResponse>, ApiError> {
    state.agent.clear_session(&session_id).await?;
    Ok(Json(ClearResponse {
        message: "Conversation cleared".into(),
        session_id,
    }))
}

async fn list_sessions_handler(
    State(state): State<SharedApiState>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.agent.list_active_sessions().await?;
    Ok(Json(SessionListResponse {
        count: sessions.len(),
        active_sessions: sessions.into_iter().collect(),
    }))
}

async fn logs_handler(
    State(state): State<SharedApiState>,
    Path(session_id): Path<String>,
) -> Result<String, ApiError> {
    let trace = state.agent.get_trace(&session_id).await?;
    Ok(if trace.is_empty() {
        NO_LOG.to_string()
    } else {
        trace
    })
}

async fn info_handler(State(state): State<SharedApiState>) -> Json<InfoResponse> {
    let controller = state.agent.controller();
    Json(InfoResponse {
        name: AGENT_NAME.into(),
        model: controller.model().to_string(),
        tools: controller
            .tools()
            .definitions()
            .into_iter()
            .map(|d| d.signature)
            .collect(),
        max_iterations: controller.max_iterations(),
        response_format: controller.parser().name().to_string(),
    })
}
