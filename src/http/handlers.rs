use super::state::{ActiveSession, AppState};
use crate::session::{
    AvatarConfig, ConfigUpdate, InputMode, Message, SessionEvent, CREDENTIAL_SETUP_STEPS,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Avatar configuration for this session
    #[serde(default)]
    pub config: AvatarConfig,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: String,
}

/// Entry-gate refusal: the caller must configure a credential first
#[derive(Debug, Serialize)]
pub struct CredentialRequiredResponse {
    pub error: String,
    pub steps: [&'static str; 3],
}

#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: InputMode,
}

#[derive(Debug, Deserialize, Default)]
pub struct ToggleRecordingRequest {
    /// Transcript captured by the voice collaborator; used when the toggle
    /// stops an active recording
    pub transcript: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub session_id: String,
    pub events: Vec<SessionEvent>,
}

#[derive(Debug, Deserialize)]
pub struct EnhancePromptRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct EnhancePromptResponse {
    pub original: String,
    pub enhanced: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Create a conversation session, gated on a configured credential
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> impl IntoResponse {
    if !req.config.can_start_session() {
        return (
            StatusCode::PRECONDITION_FAILED,
            Json(CredentialRequiredResponse {
                error: "An API credential is required before starting an avatar session"
                    .to_string(),
                steps: CREDENTIAL_SETUP_STEPS,
            }),
        )
            .into_response();
    }

    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));

    {
        let sessions = state.sessions.read().await;
        if sessions.contains_key(&session_id) {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("Session {} already exists", session_id),
                }),
            )
                .into_response();
        }
    }

    info!("Starting conversation session: {}", session_id);

    let session = Arc::new(ActiveSession::start(
        req.config,
        Arc::clone(&state.provider),
        &state.defaults,
    ));

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), session);
    }

    (
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id,
            status: "started".to_string(),
        }),
    )
        .into_response()
}

/// PATCH /sessions/:session_id/config
/// Merge a partial configuration update; the engine sees it on its next
/// operation
pub async fn update_config(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(update): Json<ConfigUpdate>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    {
        let mut config = session.config.write().await;
        update.apply(&mut config);
    }

    Json(session.engine.status().await).into_response()
}

/// POST /sessions/:session_id/mode
pub async fn set_mode(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SetModeRequest>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    session.engine.set_input_mode(req.mode).await;
    Json(session.engine.status().await).into_response()
}

/// POST /sessions/:session_id/recording/toggle
pub async fn toggle_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<ToggleRecordingRequest>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    session.engine.toggle_recording(req.transcript.as_deref()).await;
    Json(session.engine.status().await).into_response()
}

/// POST /sessions/:session_id/messages
pub async fn submit_text(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SubmitTextRequest>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    session.engine.submit_text(&req.text).await;
    Json(session.engine.status().await).into_response()
}

/// POST /sessions/:session_id/clear
pub async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    session.engine.clear_history().await;
    Json(session.engine.status().await).into_response()
}

/// POST /sessions/:session_id/save
pub async fn request_save(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    session.engine.request_save().await;
    Json(session.engine.status().await).into_response()
}

/// POST /sessions/:session_id/end
/// Auto-saves and resets the session; the session stays addressable
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    session.engine.end_session().await;
    Json(session.engine.status().await).into_response()
}

/// DELETE /sessions/:session_id
/// End the session, tear down its background tasks, and forget it
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let removed = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match removed {
        Some(session) => {
            session.engine.end_session().await;
            session.engine.shutdown().await;
            info!("Deleted session: {}", session_id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// GET /sessions/:session_id/status
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    Json(session.engine.status().await).into_response()
}

/// GET /sessions/:session_id/transcript
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    let messages = session.engine.messages().await;
    Json(TranscriptResponse {
        session_id,
        messages,
    })
    .into_response()
}

/// GET /sessions/:session_id/events
/// Drain lifecycle events collected since the last call
pub async fn drain_events(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = lookup(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    let events = {
        let mut events = session.events.lock().await;
        std::mem::take(&mut *events)
    };

    Json(EventsResponse {
        session_id,
        events,
    })
    .into_response()
}

/// POST /prompt/enhance
pub async fn enhance_prompt(
    State(state): State<AppState>,
    Json(req): Json<EnhancePromptRequest>,
) -> impl IntoResponse {
    match state.enhancer.enhance(&req.prompt).await {
        Ok(enhanced) => Json(EnhancePromptResponse {
            original: req.prompt,
            enhanced,
        })
        .into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================================
// Helpers
// ============================================================================

async fn lookup(state: &AppState, session_id: &str) -> Option<Arc<ActiveSession>> {
    let sessions = state.sessions.read().await;
    sessions.get(session_id).cloned()
}

fn session_not_found(session_id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("No session with ID {}", session_id),
        }),
    )
        .into_response()
}
