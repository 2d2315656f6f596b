use sqlx::sqlite::SqliteExecutor;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::Conversation;
use crate::error::AppError;

pub struct ConversationRepository;

impl ConversationRepository {
    pub async fn create<'e>(
        executor: impl SqliteExecutor<'e>,
        user_id: &str,
        name: &str,
    ) -> Result<Conversation, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
INSERT INTO conversations (id, user_id, name, created_at)
VALUES (?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(created_at)
        .fetch_one(executor)
        .await?;

        Ok(conversation)
    }

    /// Oldest first.
    pub async fn list(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<Conversation>, AppError> {
        let conversations = sqlx::query_as::<_, Conversation>(
            r#"
SELECT id, user_id, name, created_at
FROM conversations
WHERE user_id = ?
ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(conversations)
    }

    pub async fn get(
        pool: &Pool<Sqlite>,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Conversation>, AppError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT id, user_id, name, created_at FROM conversations WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    pub async fn find_by_name(
        pool: &Pool<Sqlite>,
        user_id: &str,
        name: &str,
    ) -> Result<Option<Conversation>, AppError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT id, user_id, name, created_at FROM conversations WHERE user_id = ? AND name = ?",
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    pub async fn count(pool: &Pool<Sqlite>, user_id: &str) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Returns `false` when the conversation does not belong to the user.
    pub async fn rename(
        pool: &Pool<Sqlite>,
        user_id: &str,
        id: &str,
        name: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE conversations SET name = ? WHERE id = ? AND user_id = ?")
            .bind(name)
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete the conversation and its messages, messages first.
    /// Returns `false` when the conversation does not belong to the user.
    pub async fn delete(pool: &Pool<Sqlite>, user_id: &str, id: &str) -> Result<bool, AppError> {
        let mut tx = pool.begin().await?;

        let owned: Option<(String,)> =
            sqlx::query_as("SELECT id FROM conversations WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        if owned.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM conversations WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }
}
