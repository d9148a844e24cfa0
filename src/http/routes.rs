use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/sessions", post(handlers::start_session))
        .route("/sessions/:session_id", delete(handlers::delete_session))
        .route("/sessions/:session_id/end", post(handlers::end_session))
        // Session operations
        .route(
            "/sessions/:session_id/config",
            patch(handlers::update_config),
        )
        .route("/sessions/:session_id/mode", post(handlers::set_mode))
        .route(
            "/sessions/:session_id/recording/toggle",
            post(handlers::toggle_recording),
        )
        .route(
            "/sessions/:session_id/messages",
            post(handlers::submit_text),
        )
        .route("/sessions/:session_id/clear", post(handlers::clear_history))
        .route("/sessions/:session_id/save", post(handlers::request_save))
        // Session queries
        .route("/sessions/:session_id/status", get(handlers::get_status))
        .route(
            "/sessions/:session_id/transcript",
            get(handlers::get_transcript),
        )
        .route("/sessions/:session_id/events", get(handlers::drain_events))
        // Prompt tooling
        .route("/prompt/enhance", post(handlers::enhance_prompt))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
