use serde::Serialize;

use crate::auth::Identity;
use crate::chat::ChatMode;
use crate::config::DEFAULT_CHAT_MODEL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    Anonymous,
    Authenticated(Identity),
}

/// Everything one client's interaction depends on, passed explicitly to
/// every command.
///
/// Starts out anonymous with no conversation selected; `reset` returns to
/// that state on logout.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub auth: AuthState,
    #[serde(skip)]
    pub token: Option<String>,
    pub current_conversation: Option<String>,
    pub mode: ChatMode,
    pub model: String,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            auth: AuthState::Anonymous,
            token: None,
            current_conversation: None,
            mode: ChatMode::default(),
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.auth {
            AuthState::Authenticated(identity) => Some(identity),
            AuthState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    pub(crate) fn authenticate(&mut self, identity: Identity, token: String) {
        self.auth = AuthState::Authenticated(identity);
        self.token = Some(token);
        self.current_conversation = None;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_returns_to_anonymous() {
        let mut ctx = SessionContext::new();
        ctx.authenticate(
            Identity {
                user_id: "u1".to_string(),
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
            },
            "tok".to_string(),
        );
        ctx.current_conversation = Some("c1".to_string());
        ctx.mode = ChatMode::Design;
        assert!(ctx.is_authenticated());

        ctx.reset();
        assert_eq!(ctx.auth, AuthState::Anonymous);
        assert!(ctx.token.is_none());
        assert!(ctx.current_conversation.is_none());
        assert_eq!(ctx.mode, ChatMode::General);
        assert_eq!(ctx.model, DEFAULT_CHAT_MODEL);
    }
}
