use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route(
            "/api/chat/messages",
            get(handlers::list_messages).post(handlers::append_message),
        )
        .route("/api/logs", post(handlers::create_log))
        .route("/api/logs/:id", put(handlers::update_log))
        .route("/api/logs/:kind/:id", delete(handlers::delete_log))
        .route("/api/history", get(handlers::get_history))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/stats", get(handlers::get_stats))
        .route(
            "/api/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
