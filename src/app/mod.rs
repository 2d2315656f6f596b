//! The command layer: every user action is a `Command` applied to an explicit
//! `SessionContext`, producing a `View` for the host to render.

pub mod command;
pub mod context;
pub mod conversations;

pub use command::{Command, MessageView, Settings, View};
pub use context::{AuthState, SessionContext};

use sqlx::{Pool, Sqlite};

use crate::auth::{AuthService, ClientStorage, SESSION_TOKEN_KEY};
use crate::chat::{extract_html, validate_image, ChatClient, ChatMode, Message, Role};
use crate::config::{Config, DEFAULT_CHAT_MODEL};
use crate::db::{Conversation, ConversationRepository, MessageRepository, MessageRow};
use crate::error::AppError;

#[derive(Clone)]
pub struct App {
    db: Pool<Sqlite>,
    auth: AuthService,
    chat: ChatClient,
    default_api_key: Option<String>,
    default_model: String,
}

impl App {
    pub fn new(db: Pool<Sqlite>, config: &Config) -> Result<Self, AppError> {
        let chat = ChatClient::new(config.chat_api_url.clone(), config.chat_timeout())?;
        let mut app = Self::with_chat_client(
            db,
            config.session_ttl()?,
            chat,
            config.chat_api_key.clone(),
        );
        app.default_model = config.chat_model.clone();
        Ok(app)
    }

    pub fn with_chat_client(
        db: Pool<Sqlite>,
        session_ttl: chrono::Duration,
        chat: ChatClient,
        default_api_key: Option<String>,
    ) -> Self {
        Self {
            auth: AuthService::new(db.clone(), session_ttl),
            db,
            chat,
            default_api_key,
            default_model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }

    /// A fresh anonymous context using the configured model when the default
    /// mode offers it.
    pub fn new_context(&self) -> SessionContext {
        let mut ctx = SessionContext::new();
        if offers(ctx.mode, &self.default_model) {
            ctx.model = self.default_model.clone();
        }
        ctx
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub async fn dispatch<S>(
        &self,
        ctx: &mut SessionContext,
        storage: &mut S,
        command: Command,
    ) -> Result<View, AppError>
    where
        S: ClientStorage + Send,
    {
        if !command.is_public() && !ctx.is_authenticated() {
            return Err(AppError::authentication("not authenticated"));
        }

        match command {
            Command::Register {
                username,
                password,
                confirm_password,
                email,
            } => {
                let user = self
                    .auth
                    .register(&username, &password, &confirm_password, &email)
                    .await?;
                Ok(View::Registered {
                    username: user.username,
                })
            }

            Command::Login {
                username,
                password,
                remember,
            } => {
                let outcome = self.auth.login(&username, &password).await?;

                // Nothing reaches the client until the user's workspace loads.
                let current = conversations::ensure_one(&self.db, &outcome.identity.user_id).await?;
                let conversations =
                    ConversationRepository::list(&self.db, &outcome.identity.user_id).await?;

                let ttl = if remember {
                    self.auth.session_ttl().to_std().ok()
                } else {
                    None
                };
                storage.set(SESSION_TOKEN_KEY, &outcome.token, ttl);

                ctx.authenticate(outcome.identity.clone(), outcome.token.clone());
                ctx.current_conversation = Some(current.id.clone());

                Ok(View::LoggedIn {
                    conversations,
                    identity: outcome.identity,
                    token: outcome.token,
                    expires_at: outcome.expires_at,
                    current_conversation: current.id,
                })
            }

            Command::Logout => {
                let token = ctx.token.clone().or_else(|| storage.get(SESSION_TOKEN_KEY));
                let result = match token {
                    Some(token) => self.auth.logout(&token).await,
                    None => Ok(()),
                };

                storage.clear(SESSION_TOKEN_KEY);
                ctx.reset();
                result?;

                Ok(View::LoggedOut)
            }

            Command::Resume => {
                let token = storage
                    .get(SESSION_TOKEN_KEY)
                    .or_else(|| ctx.token.clone())
                    .unwrap_or_default();

                match self.auth.resume(&token).await? {
                    Some(identity) => {
                        let current = conversations::ensure_one(&self.db, &identity.user_id).await?;
                        let conversations =
                            ConversationRepository::list(&self.db, &identity.user_id).await?;

                        ctx.authenticate(identity.clone(), token);
                        ctx.current_conversation = Some(current.id.clone());

                        Ok(View::Resumed {
                            conversations,
                            identity,
                            current_conversation: current.id,
                        })
                    }
                    None => {
                        storage.clear(SESSION_TOKEN_KEY);
                        ctx.reset();
                        Ok(View::Anonymous)
                    }
                }
            }

            Command::SetApiKey { api_key } => {
                let user_id = user_id(ctx)?;
                self.auth.set_api_key(&user_id, &api_key).await?;
                Ok(View::Settings(self.settings(ctx).await?))
            }

            Command::SetMode { mode, model } => {
                match model.map(|m| m.trim().to_string()) {
                    Some(model) if offers(mode, &model) => ctx.model = model,
                    Some(model) => {
                        return Err(AppError::validation(format!(
                            "model {} is not available in this mode",
                            model
                        )))
                    }
                    None if !offers(mode, &ctx.model) => {
                        ctx.model = mode.models()[0].to_string();
                    }
                    None => {}
                }
                ctx.mode = mode;
                Ok(View::Settings(self.settings(ctx).await?))
            }

            Command::ListConversations => {
                let user_id = user_id(ctx)?;
                let current = self.current_conversation(ctx, &user_id).await?;
                self.conversations_view(&user_id, current.id).await
            }

            Command::NewConversation { name } => {
                let user_id = user_id(ctx)?;
                let created = conversations::create(&self.db, &user_id, name.as_deref()).await?;
                ctx.current_conversation = Some(created.id.clone());
                self.conversations_view(&user_id, created.id).await
            }

            Command::SelectConversation { conversation_id } => {
                let user_id = user_id(ctx)?;
                let conversation = ConversationRepository::get(&self.db, &user_id, &conversation_id)
                    .await?
                    .ok_or_else(|| AppError::validation("conversation not found"))?;
                ctx.current_conversation = Some(conversation.id.clone());
                self.history_view(conversation, ctx.mode).await
            }

            Command::RenameConversation {
                conversation_id,
                name,
            } => {
                let user_id = user_id(ctx)?;
                conversations::rename(&self.db, &user_id, &conversation_id, &name).await?;
                let current = self.current_conversation(ctx, &user_id).await?;
                self.conversations_view(&user_id, current.id).await
            }

            Command::DeleteConversation { conversation_id } => {
                let user_id = user_id(ctx)?;
                let fallback = conversations::delete(&self.db, &user_id, &conversation_id).await?;
                if ctx.current_conversation.as_deref() == Some(conversation_id.as_str()) {
                    ctx.current_conversation = Some(fallback.id.clone());
                }
                let current = self.current_conversation(ctx, &user_id).await?;
                self.conversations_view(&user_id, current.id).await
            }

            Command::SendMessage { content, image } => {
                let user_id = user_id(ctx)?;
                self.send_message(ctx, &user_id, content, image).await
            }

            Command::History => {
                let user_id = user_id(ctx)?;
                let conversation = self.current_conversation(ctx, &user_id).await?;
                self.history_view(conversation, ctx.mode).await
            }
        }
    }

    /// Save the user's message, ask the model once, and save whatever came
    /// back (the reply or the error text) as the assistant's message.
    async fn send_message(
        &self,
        ctx: &mut SessionContext,
        user_id: &str,
        content: String,
        image: Option<String>,
    ) -> Result<View, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::validation("message cannot be empty"));
        }

        let api_key = match self.auth.api_key(user_id).await? {
            Some(key) => key,
            None => self
                .default_api_key
                .clone()
                .ok_or_else(|| AppError::validation("missing API key"))?,
        };

        let image = image
            .as_deref()
            .filter(|i| !i.trim().is_empty())
            .map(validate_image)
            .transpose()?;

        let conversation = self.current_conversation(ctx, user_id).await?;

        let user_row = MessageRepository::create(
            &self.db,
            &conversation.id,
            Role::User.as_str(),
            &content,
            image.as_deref(),
        )
        .await?;

        let history = MessageRepository::list(&self.db, &conversation.id)
            .await?
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let reply = match self.chat.complete(&api_key, &ctx.model, ctx.mode, &history).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!("completion failed for conversation {}: {}", conversation.id, err);
                err.to_string()
            }
        };

        let assistant_row = MessageRepository::create(
            &self.db,
            &conversation.id,
            Role::Assistant.as_str(),
            &reply,
            None,
        )
        .await?;

        Ok(View::Reply {
            conversation_id: conversation.id,
            user: message_view(user_row, ctx.mode)?,
            assistant: message_view(assistant_row, ctx.mode)?,
        })
    }

    /// The selected conversation if it still belongs to the user, otherwise
    /// their oldest one.
    async fn current_conversation(
        &self,
        ctx: &mut SessionContext,
        user_id: &str,
    ) -> Result<Conversation, AppError> {
        if let Some(id) = ctx.current_conversation.as_deref() {
            if let Some(conversation) = ConversationRepository::get(&self.db, user_id, id).await? {
                return Ok(conversation);
            }
        }

        let conversation = conversations::ensure_one(&self.db, user_id).await?;
        ctx.current_conversation = Some(conversation.id.clone());
        Ok(conversation)
    }

    async fn conversations_view(&self, user_id: &str, current: String) -> Result<View, AppError> {
        Ok(View::Conversations {
            conversations: ConversationRepository::list(&self.db, user_id).await?,
            current_conversation: current,
        })
    }

    async fn history_view(&self, conversation: Conversation, mode: ChatMode) -> Result<View, AppError> {
        let messages = MessageRepository::list(&self.db, &conversation.id)
            .await?
            .into_iter()
            .map(|row| message_view(row, mode))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(View::History {
            conversation,
            messages,
        })
    }

    async fn settings(&self, ctx: &SessionContext) -> Result<Settings, AppError> {
        let user_id = user_id(ctx)?;
        let has_api_key =
            self.auth.api_key(&user_id).await?.is_some() || self.default_api_key.is_some();

        Ok(Settings {
            mode: ctx.mode,
            model: ctx.model.clone(),
            models: ctx.mode.models().to_vec(),
            has_api_key,
        })
    }
}

fn user_id(ctx: &SessionContext) -> Result<String, AppError> {
    ctx.identity()
        .map(|identity| identity.user_id.clone())
        .ok_or_else(|| AppError::authentication("not authenticated"))
}

fn offers(mode: ChatMode, model: &str) -> bool {
    mode.models().iter().any(|m| *m == model)
}

fn message_view(row: MessageRow, mode: ChatMode) -> Result<MessageView, AppError> {
    let created_at = row.created_at;
    let message = Message::try_from(row)?;
    let segments = (mode.renders_html() && message.role() == Role::Assistant)
        .then(|| extract_html(message.content()));

    Ok(MessageView {
        message,
        created_at,
        segments,
    })
}
