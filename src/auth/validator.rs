use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::auth::Identity;
use crate::db::SessionRepository;
use crate::error::AppError;

/// Resolves session tokens to identities.
///
/// Nothing is cached: every call reads the store and compares against the
/// clock it is given.
#[derive(Clone)]
pub struct SessionValidator {
    db: Pool<Sqlite>,
}

impl SessionValidator {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    pub async fn validate(&self, token: &str) -> Result<Option<Identity>, AppError> {
        self.validate_at(token, Utc::now()).await
    }

    /// A session is valid only while `now < expires_at`.
    pub async fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Identity>, AppError> {
        if token.is_empty() {
            return Ok(None);
        }

        let Some(session) = SessionRepository::find(&self.db, token).await? else {
            return Ok(None);
        };

        let expired = match parse_timestamp(&session.expires_at) {
            Some(expires_at) => now >= expires_at,
            None => {
                tracing::warn!(
                    "unparsable expires_at {:?} for user {}, treating as expired",
                    session.expires_at,
                    session.user_id
                );
                true
            }
        };

        if expired {
            tracing::debug!("session for {} expired", session.username);
            if let Err(e) = SessionRepository::delete(&self.db, token).await {
                tracing::warn!("failed to delete expired session: {}", e);
            }
            return Ok(None);
        }

        Ok(Some(Identity {
            user_id: session.user_id,
            username: session.username,
            email: session.email,
        }))
    }
}

/// Parse a stored timestamp into an absolute UTC instant.
///
/// Accepts RFC 3339 (`Z` or numeric offset), the space-separated form
/// Postgres emits (`2024-05-01 10:00:00.123+00`), and offset-less values,
/// which are taken to be UTC. Fractional seconds are optional everywhere.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let mut normalized = raw.replacen(' ', "T", 1);
    if normalized.ends_with('Z') || normalized.ends_with('z') {
        normalized.pop();
        normalized.push_str("+00:00");
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%#z") {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
