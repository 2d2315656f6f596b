use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::cookies::CookieStorage;
use crate::api::state::AppState;
use crate::app::{App, Command, SessionContext, View};
use crate::error::AppError;

/// The context and cookie jar of one HTTP request.
#[derive(Clone)]
pub struct RequestSession {
    pub ctx: SessionContext,
    pub storage: CookieStorage,
}

impl RequestSession {
    pub fn from_headers(app: &App, headers: &HeaderMap, secure_cookies: bool) -> Self {
        Self {
            ctx: app.new_context(),
            storage: CookieStorage::from_headers(headers, secure_cookies),
        }
    }

    pub async fn dispatch(&mut self, app: &App, command: Command) -> Result<View, AppError> {
        app.dispatch(&mut self.ctx, &mut self.storage, command).await
    }

    /// Render the outcome, carrying any queued cookies either way.
    pub fn finish(self, result: Result<View, AppError>) -> Response {
        let mut response = match result {
            Ok(view) => Json(view).into_response(),
            Err(err) => err.into_response(),
        };
        self.storage.apply(&mut response);
        response
    }
}

/// Authentication middleware - resumes the session from the cookie or
/// bearer token and hands it to the handler.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut session =
        RequestSession::from_headers(&state.app, request.headers(), state.config.cookie_secure);

    match session.dispatch(&state.app, Command::Resume).await {
        Ok(View::Resumed { .. }) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Ok(_) => session.finish(Err(AppError::authentication("not authenticated"))),
        Err(err) => session.finish(Err(err)),
    }
}
