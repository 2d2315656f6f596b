pub mod auth;
pub mod chat;
pub mod cookies;
pub mod middleware;
pub mod state;

pub use cookies::CookieStorage;
pub use middleware::RequestSession;
pub use state::AppState;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use serde::Serialize;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/api-key", put(auth::set_api_key))
        .route(
            "/api/conversations",
            get(chat::list_conversations).post(chat::create_conversation),
        )
        .route(
            "/api/conversations/:id",
            patch(chat::rename_conversation).delete(chat::delete_conversation),
        )
        .route(
            "/api/conversations/:id/messages",
            get(chat::get_messages).post(chat::send_message),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Health check
        .route("/api/health", get(health))
        // Authentication endpoints
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Conversation endpoints
        .merge(protected)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
