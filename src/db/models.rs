use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub created_at: i64,
}

/// A session row joined with the identity fields of its owner.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: String,
    pub username: String, // Joined from users table
    pub email: String,    // Joined from users table
    pub expires_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub image: Option<String>,
    pub created_at: i64,
}
