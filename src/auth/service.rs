use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::auth::{Identity, SessionValidator};
use crate::crypto::{generate_token, hash_password, verify_password};
use crate::db::{ConversationRepository, SessionRepository, User, UserRepository};
use crate::error::AppError;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const DEFAULT_CONVERSATION_NAME: &str = "Conversation 1";

/// Login never says which of the two fields was wrong.
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

/// What a successful login hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    db: Pool<Sqlite>,
    validator: SessionValidator,
    session_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(db: Pool<Sqlite>, session_ttl: chrono::Duration) -> Self {
        Self {
            validator: SessionValidator::new(db.clone()),
            db,
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        self.session_ttl
    }

    /// Create an account with one default conversation. Does not log in.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
        email: &str,
    ) -> Result<User, AppError> {
        let username = username.trim();
        let email = email.trim().to_lowercase();

        if username.chars().count() < MIN_USERNAME_LENGTH {
            return Err(AppError::validation("username too short"));
        }
        if !email.contains('@') || !email.contains('.') {
            return Err(AppError::validation("invalid email"));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::validation("password too short"));
        }
        if password != confirm {
            return Err(AppError::validation("passwords do not match"));
        }

        if UserRepository::get_by_username(&self.db, username).await?.is_some() {
            return Err(AppError::validation("username taken"));
        }
        if UserRepository::get_by_email(&self.db, &email).await?.is_some() {
            return Err(AppError::validation("email taken"));
        }

        let password_hash = hash_password(password)?;

        let mut tx = self.db.begin().await?;
        let user = UserRepository::create(&mut *tx, username, &email, &password_hash)
            .await
            .map_err(unique_violation_to_rejection)?;
        ConversationRepository::create(&mut *tx, &user.id, DEFAULT_CONVERSATION_NAME).await?;
        tx.commit().await?;

        tracing::info!("registered user {}", user.username);

        Ok(user)
    }

    /// Verify credentials and issue a fresh session, revoking any other
    /// session the user holds.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let username = username.trim();

        let Some(user) = UserRepository::get_by_username(&self.db, username).await? else {
            // Burn the same time a real verification would take.
            let _ = verify_password(password, dummy_hash());
            tracing::debug!("login for unknown user {}", username);
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        };

        if !verify_password(password, &user.password_hash) {
            tracing::debug!("bad password for {}", user.username);
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        }

        let token = generate_token();
        let expires_at = Utc::now() + self.session_ttl;
        SessionRepository::replace(&self.db, &user.id, &token, expires_at).await?;

        tracing::info!("user {} logged in", user.username);

        Ok(LoginOutcome {
            identity: Identity {
                user_id: user.id,
                username: user.username,
                email: user.email,
            },
            token,
            expires_at,
        })
    }

    /// Revoke a session. Unknown or empty tokens are fine.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        if token.is_empty() {
            return Ok(());
        }

        SessionRepository::delete(&self.db, token).await?;
        tracing::info!("session revoked");

        Ok(())
    }

    /// Silent re-authentication from a stored token.
    pub async fn resume(&self, token: &str) -> Result<Option<Identity>, AppError> {
        self.validator.validate(token).await
    }

    pub fn validator(&self) -> &SessionValidator {
        &self.validator
    }

    /// Store the user's own completion API key. Blank clears it.
    pub async fn set_api_key(&self, user_id: &str, api_key: &str) -> Result<(), AppError> {
        let api_key = api_key.trim();
        let value = (!api_key.is_empty()).then_some(api_key);
        UserRepository::set_api_key(&self.db, user_id, value).await
    }

    pub async fn api_key(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let user = UserRepository::get_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::Internal("User not found".to_string()))?;

        Ok(user.api_key)
    }
}

/// A concurrent registration can slip past the lookups above; the unique
/// constraints still reject it and we report it the same way.
fn unique_violation_to_rejection(err: AppError) -> AppError {
    match err {
        AppError::Store(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            if db_err.message().contains("email") {
                AppError::validation("email taken")
            } else {
                AppError::validation("username taken")
            }
        }
        other => other,
    }
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("timing-equalizer").unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    async fn service() -> AuthService {
        let pool = memory_pool().await.unwrap();
        AuthService::new(pool, chrono::Duration::hours(1))
    }

    #[tokio::test]
    async fn register_rejects_policy_violations() {
        let auth = service().await;

        let cases = [
            ("al", "secret1", "secret1", "a@x.com", "username too short"),
            ("alice", "secret1", "secret1", "ax.com", "invalid email"),
            ("alice", "secret1", "secret1", "a@xcom", "invalid email"),
            ("alice", "short", "short", "a@x.com", "password too short"),
            ("alice", "secret1", "secret2", "a@x.com", "passwords do not match"),
        ];

        for (username, password, confirm, email, expected) in cases {
            let err = auth.register(username, password, confirm, email).await.unwrap_err();
            assert!(
                matches!(&err, AppError::Validation(msg) if msg == expected),
                "expected {expected}, got {err:?}"
            );
        }

        assert!(UserRepository::get_by_username(&auth.db, "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn register_creates_user_and_default_conversation() {
        let auth = service().await;
        let user = auth.register("alice", "secret1", "secret1", "A@X.com").await.unwrap();

        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.password_hash, "secret1");

        let conversations = ConversationRepository::list(&auth.db, &user.id).await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].name, DEFAULT_CONVERSATION_NAME);

        // registration does not log in
        assert_eq!(SessionRepository::count_for_user(&auth.db, &user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let auth = service().await;
        auth.register("alice", "secret1", "secret1", "a@x.com").await.unwrap();

        let err = auth.register("alice", "other1", "other1", "b@y.com").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "username taken"));

        let err = auth.register("alice2", "other1", "other1", "a@x.com").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "email taken"));
    }

    #[tokio::test]
    async fn login_failures_are_uniform() {
        let auth = service().await;
        auth.register("alice", "secret1", "secret1", "a@x.com").await.unwrap();

        let unknown = auth.login("nobody", "secret1").await.unwrap_err();
        let wrong = auth.login("alice", "wrong-password").await.unwrap_err();

        assert_eq!(unknown.to_string(), INVALID_CREDENTIALS);
        assert_eq!(wrong.to_string(), INVALID_CREDENTIALS);
        assert!(matches!(unknown, AppError::Authentication(_)));
        assert!(matches!(wrong, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn second_login_revokes_first_token() {
        let auth = service().await;
        auth.register("alice", "secret1", "secret1", "a@x.com").await.unwrap();

        let first = auth.login("alice", "secret1").await.unwrap();
        assert!(auth.resume(&first.token).await.unwrap().is_some());

        let second = auth.login("alice", "secret1").await.unwrap();
        assert_ne!(first.token, second.token);
        assert!(auth.resume(&first.token).await.unwrap().is_none());
        assert_eq!(auth.resume(&second.token).await.unwrap().unwrap().username, "alice");
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let auth = service().await;
        auth.register("alice", "secret1", "secret1", "a@x.com").await.unwrap();
        let outcome = auth.login("alice", "secret1").await.unwrap();

        auth.logout(&outcome.token).await.unwrap();
        auth.logout(&outcome.token).await.unwrap();
        auth.logout("").await.unwrap();
        assert!(auth.resume(&outcome.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_failure_is_not_a_rejection() {
        let auth = service().await;
        auth.db.close().await;

        let err = auth.login("alice", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }

    #[tokio::test]
    async fn api_key_can_be_set_and_cleared() {
        let auth = service().await;
        let user = auth.register("alice", "secret1", "secret1", "a@x.com").await.unwrap();

        assert_eq!(auth.api_key(&user.id).await.unwrap(), None);
        auth.set_api_key(&user.id, " gsk_123 ").await.unwrap();
        assert_eq!(auth.api_key(&user.id).await.unwrap().as_deref(), Some("gsk_123"));
        auth.set_api_key(&user.id, "").await.unwrap();
        assert_eq!(auth.api_key(&user.id).await.unwrap(), None);
    }
}
