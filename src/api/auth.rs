use axum::{extract::State, http::HeaderMap, response::Response, Extension, Json};
use serde::Deserialize;

use crate::api::middleware::RequestSession;
use crate::api::state::AppState;
use crate::app::{Command, View};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    pub api_key: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let mut session =
        RequestSession::from_headers(&state.app, &headers, state.config.cookie_secure);
    let result = session
        .dispatch(
            &state.app,
            Command::Register {
                username: req.username,
                password: req.password,
                confirm_password: req.confirm_password,
                email: req.email,
            },
        )
        .await;
    session.finish(result)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Response {
    let mut session =
        RequestSession::from_headers(&state.app, &headers, state.config.cookie_secure);
    let result = session
        .dispatch(
            &state.app,
            Command::Login {
                username: req.username,
                password: req.password,
                remember: req.remember,
            },
        )
        .await;
    session.finish(result)
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut session =
        RequestSession::from_headers(&state.app, &headers, state.config.cookie_secure);
    let result = session.dispatch(&state.app, Command::Logout).await;
    session.finish(result)
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut session =
        RequestSession::from_headers(&state.app, &headers, state.config.cookie_secure);
    let result = match session.dispatch(&state.app, Command::Resume).await {
        Ok(View::Anonymous) => Err(AppError::authentication("not authenticated")),
        other => other,
    };
    session.finish(result)
}

/// PUT /api/auth/api-key (requires auth)
pub async fn set_api_key(
    State(state): State<AppState>,
    Extension(mut session): Extension<RequestSession>,
    Json(req): Json<ApiKeyRequest>,
) -> Response {
    let result = session
        .dispatch(&state.app, Command::SetApiKey { api_key: req.api_key })
        .await;
    session.finish(result)
}
