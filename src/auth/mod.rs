//! Credential and session lifecycle: hashing, token issuance, validation and
//! the register/login/logout/resume flows built on them.

pub mod service;
pub mod storage;
pub mod validator;

pub use service::{AuthService, LoginOutcome};
pub use storage::{ClientStorage, MemoryStorage, SESSION_TOKEN_KEY};
pub use validator::{parse_timestamp, SessionValidator};

use serde::{Deserialize, Serialize};

/// Who a valid session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub email: String,
}
