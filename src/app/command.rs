use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::chat::{ChatMode, Message, Segment};
use crate::db::Conversation;

/// One user action. Each is handled to completion by `App::dispatch`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Register {
        username: String,
        password: String,
        confirm_password: String,
        email: String,
    },
    Login {
        username: String,
        password: String,
        #[serde(default)]
        remember: bool,
    },
    Logout,
    Resume,
    SetApiKey {
        api_key: String,
    },
    SetMode {
        mode: ChatMode,
        model: Option<String>,
    },
    ListConversations,
    NewConversation {
        name: Option<String>,
    },
    SelectConversation {
        conversation_id: String,
    },
    RenameConversation {
        conversation_id: String,
        name: String,
    },
    DeleteConversation {
        conversation_id: String,
    },
    SendMessage {
        content: String,
        image: Option<String>,
    },
    History,
}

impl Command {
    /// Commands an anonymous client may issue.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Command::Register { .. } | Command::Login { .. } | Command::Resume | Command::Logout
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub created_at: i64,
    /// Present for assistant replies shown in a mode that previews HTML.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub mode: ChatMode,
    pub model: String,
    pub models: Vec<&'static str>,
    pub has_api_key: bool,
}

/// What a host renders after a command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Registered {
        username: String,
    },
    LoggedIn {
        identity: Identity,
        token: String,
        expires_at: DateTime<Utc>,
        conversations: Vec<Conversation>,
        current_conversation: String,
    },
    LoggedOut,
    Anonymous,
    Resumed {
        identity: Identity,
        conversations: Vec<Conversation>,
        current_conversation: String,
    },
    Settings(Settings),
    Conversations {
        conversations: Vec<Conversation>,
        current_conversation: String,
    },
    History {
        conversation: Conversation,
        messages: Vec<MessageView>,
    },
    Reply {
        conversation_id: String,
        user: MessageView,
        assistant: MessageView,
    },
}
