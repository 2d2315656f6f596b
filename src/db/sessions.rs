use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Pool, Sqlite};

use crate::db::models::SessionRecord;
use crate::error::AppError;

pub struct SessionRepository;

impl SessionRepository {
    /// Drop every session the user holds and store `token` as the only one.
    /// Both steps run in one transaction so a user never ends up with two
    /// live sessions or none after a failed swap.
    pub async fn replace(
        pool: &Pool<Sqlite>,
        user_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let created_at = Utc::now().timestamp();
        let expires_at = expires_at.to_rfc3339_opts(SecondsFormat::Micros, true);

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
INSERT INTO sessions (token, user_id, created_at, expires_at)
VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(created_at)
        .bind(&expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn find(
        pool: &Pool<Sqlite>,
        token: &str,
    ) -> Result<Option<SessionRecord>, AppError> {
        let session = sqlx::query_as::<_, SessionRecord>(
            r#"
SELECT s.token, s.user_id, u.username, u.email, s.expires_at
FROM sessions s
JOIN users u ON s.user_id = u.id
WHERE s.token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Deleting a token that does not exist is not an error.
    pub async fn delete(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn count_for_user(pool: &Pool<Sqlite>, user_id: &str) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
