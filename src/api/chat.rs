use axum::{
    extract::{Path, Query, State},
    response::Response,
    Extension, Json,
};
use serde::Deserialize;

use crate::api::middleware::RequestSession;
use crate::api::state::AppState;
use crate::app::{Command, View};
use crate::chat::ChatMode;
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct NewConversationRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameConversationRequest {
    pub name: String,
}

/// Display settings for a history read. Design mode previews HTML in
/// assistant replies.
#[derive(Debug, Default, Deserialize)]
pub struct GetMessagesQuery {
    pub mode: Option<ChatMode>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub image: Option<String>, // Base64 encoded PNG or JPEG
    pub mode: Option<ChatMode>,
    pub model: Option<String>,
}

/// GET /api/conversations (requires auth)
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(mut session): Extension<RequestSession>,
) -> Response {
    let result = session.dispatch(&state.app, Command::ListConversations).await;
    session.finish(result)
}

/// POST /api/conversations (requires auth)
pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(mut session): Extension<RequestSession>,
    Json(req): Json<NewConversationRequest>,
) -> Response {
    let result = session
        .dispatch(&state.app, Command::NewConversation { name: req.name })
        .await;
    session.finish(result)
}

/// PATCH /api/conversations/:id (requires auth)
pub async fn rename_conversation(
    State(state): State<AppState>,
    Extension(mut session): Extension<RequestSession>,
    Path(conversation_id): Path<String>,
    Json(req): Json<RenameConversationRequest>,
) -> Response {
    let result = session
        .dispatch(
            &state.app,
            Command::RenameConversation {
                conversation_id,
                name: req.name,
            },
        )
        .await;
    session.finish(result)
}

/// DELETE /api/conversations/:id (requires auth)
pub async fn delete_conversation(
    State(state): State<AppState>,
    Extension(mut session): Extension<RequestSession>,
    Path(conversation_id): Path<String>,
) -> Response {
    let result = session
        .dispatch(&state.app, Command::DeleteConversation { conversation_id })
        .await;
    session.finish(result)
}

/// GET /api/conversations/:id/messages (requires auth)
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(mut session): Extension<RequestSession>,
    Path(conversation_id): Path<String>,
    Query(query): Query<GetMessagesQuery>,
) -> Response {
    let result = history_in_conversation(&state, &mut session, conversation_id, query).await;
    session.finish(result)
}

async fn history_in_conversation(
    state: &AppState,
    session: &mut RequestSession,
    conversation_id: String,
    query: GetMessagesQuery,
) -> Result<View, AppError> {
    apply_mode(state, session, query.mode, query.model).await?;
    session
        .dispatch(&state.app, Command::SelectConversation { conversation_id })
        .await
}

/// POST /api/conversations/:id/messages (requires auth)
pub async fn send_message(
    State(state): State<AppState>,
    Extension(mut session): Extension<RequestSession>,
    Path(conversation_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let result = send_in_conversation(&state, &mut session, conversation_id, req).await;
    session.finish(result)
}

async fn send_in_conversation(
    state: &AppState,
    session: &mut RequestSession,
    conversation_id: String,
    req: SendMessageRequest,
) -> Result<View, AppError> {
    session
        .dispatch(&state.app, Command::SelectConversation { conversation_id })
        .await?;

    apply_mode(state, session, req.mode, req.model).await?;

    session
        .dispatch(
            &state.app,
            Command::SendMessage {
                content: req.content,
                image: req.image,
            },
        )
        .await
}

async fn apply_mode(
    state: &AppState,
    session: &mut RequestSession,
    mode: Option<ChatMode>,
    model: Option<String>,
) -> Result<(), AppError> {
    if mode.is_none() && model.is_none() {
        return Ok(());
    }

    let mode = mode.unwrap_or(session.ctx.mode);
    session
        .dispatch(&state.app, Command::SetMode { mode, model })
        .await?;

    Ok(())
}
