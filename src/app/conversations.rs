use sqlx::{Pool, Sqlite};

use crate::db::{Conversation, ConversationRepository};
use crate::error::AppError;

/// The user's oldest conversation, creating one if they have none.
pub async fn ensure_one(db: &Pool<Sqlite>, user_id: &str) -> Result<Conversation, AppError> {
    if let Some(first) = ConversationRepository::list(db, user_id).await?.into_iter().next() {
        return Ok(first);
    }

    create(db, user_id, None).await
}

/// Create a conversation, named `Conversation N` unless a name is given.
pub async fn create(
    db: &Pool<Sqlite>,
    user_id: &str,
    name: Option<&str>,
) -> Result<Conversation, AppError> {
    let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => {
            if ConversationRepository::find_by_name(db, user_id, name).await?.is_some() {
                return Err(AppError::validation("a conversation with that name already exists"));
            }
            name.to_string()
        }
        None => next_default_name(db, user_id).await?,
    };

    let conversation = ConversationRepository::create(db, user_id, &name).await?;
    tracing::debug!("created conversation {:?} for {}", conversation.name, user_id);

    Ok(conversation)
}

async fn next_default_name(db: &Pool<Sqlite>, user_id: &str) -> Result<String, AppError> {
    let mut n = ConversationRepository::count(db, user_id).await? + 1;
    loop {
        let candidate = format!("Conversation {}", n);
        if ConversationRepository::find_by_name(db, user_id, &candidate).await?.is_none() {
            return Ok(candidate);
        }
        n += 1;
    }
}

pub async fn rename(
    db: &Pool<Sqlite>,
    user_id: &str,
    conversation_id: &str,
    new_name: &str,
) -> Result<Conversation, AppError> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(AppError::validation("conversation name cannot be empty"));
    }

    let conversation = ConversationRepository::get(db, user_id, conversation_id)
        .await?
        .ok_or_else(|| AppError::validation("conversation not found"))?;

    if conversation.name == new_name {
        return Ok(conversation);
    }

    if ConversationRepository::find_by_name(db, user_id, new_name).await?.is_some() {
        return Err(AppError::validation("a conversation with that name already exists"));
    }

    ConversationRepository::rename(db, user_id, conversation_id, new_name).await?;

    Ok(Conversation {
        name: new_name.to_string(),
        ..conversation
    })
}

/// Delete a conversation and return the one that should become current.
/// A user is never left without a conversation.
pub async fn delete(
    db: &Pool<Sqlite>,
    user_id: &str,
    conversation_id: &str,
) -> Result<Conversation, AppError> {
    if !ConversationRepository::delete(db, user_id, conversation_id).await? {
        return Err(AppError::validation("conversation not found"));
    }

    ensure_one(db, user_id).await
}
