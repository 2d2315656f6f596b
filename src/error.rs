use thiserror::Error;

/// Shown to callers in place of store-level details.
pub const STORE_FAILURE_MESSAGE: &str = "Service temporarily unavailable, please try again";

#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected by a policy check (short password, taken username, ...).
    #[error("{0}")]
    Validation(String),

    /// Unknown user, wrong password, or a missing/expired session.
    #[error("{0}")]
    Authentication(String),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        AppError::Authentication(msg.into())
    }

    /// The text a user should see. Store and internal failures never leak
    /// their underlying cause.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Authentication(msg) => msg.clone(),
            AppError::Store(_) => STORE_FAILURE_MESSAGE.to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration failed: {}", err))
    }
}

// Axum IntoResponse implementation for HTTP errors
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::Validation(msg) => {
                tracing::debug!("validation rejected: {}", msg);
                StatusCode::BAD_REQUEST
            }
            AppError::Authentication(msg) => {
                tracing::debug!("authentication rejected: {}", msg);
                StatusCode::UNAUTHORIZED
            }
            AppError::Store(err) => {
                tracing::error!("store failure: {}", err);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Config(msg) | AppError::Internal(msg) => {
                tracing::error!("internal failure: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.user_message(),
        });

        (status, axum::Json(body)).into_response()
    }
}
