use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::MessageRow;
use crate::error::AppError;

pub struct MessageRepository;

impl MessageRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        conversation_id: &str,
        role: &str,
        content: &str,
        image: Option<&str>,
    ) -> Result<MessageRow, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        let message = sqlx::query_as::<_, MessageRow>(
            r#"
INSERT INTO messages (id, conversation_id, role, content, image, created_at)
VALUES (?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(role)
        .bind(content)
        .bind(image)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    /// Full history of a conversation in the order it was written.
    pub async fn list(
        pool: &Pool<Sqlite>,
        conversation_id: &str,
    ) -> Result<Vec<MessageRow>, AppError> {
        let messages = sqlx::query_as::<_, MessageRow>(
            r#"
SELECT id, conversation_id, role, content, image, created_at
FROM messages
WHERE conversation_id = ?
ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    pub async fn count(pool: &Pool<Sqlite>, conversation_id: &str) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
