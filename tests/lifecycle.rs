use std::time::Duration;

use chrono::Utc;

use frejus_chat::app::{App, Command, SessionContext, View};
use frejus_chat::auth::{ClientStorage, MemoryStorage, SESSION_TOKEN_KEY};
use frejus_chat::chat::ChatClient;
use frejus_chat::db::{memory_pool, SessionRepository};
use frejus_chat::error::AppError;

async fn app() -> App {
    let db = memory_pool().await.unwrap();
    // Nothing listens here; these scenarios never reach the model.
    let chat = ChatClient::new("http://127.0.0.1:9/v1/chat/completions", Duration::from_secs(1))
        .unwrap();
    App::with_chat_client(db, chrono::Duration::hours(1), chat, None)
}

fn register(username: &str, email: &str) -> Command {
    Command::Register {
        username: username.to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
        email: email.to_string(),
    }
}

fn login(username: &str, password: &str, remember: bool) -> Command {
    Command::Login {
        username: username.to_string(),
        password: password.to_string(),
        remember,
    }
}

#[tokio::test]
async fn alice_full_lifecycle() {
    let app = app().await;
    let mut ctx = SessionContext::new();
    let mut storage = MemoryStorage::new();

    let view = app
        .dispatch(&mut ctx, &mut storage, register("alice", "alice@example.com"))
        .await
        .unwrap();
    assert!(matches!(view, View::Registered { ref username } if username == "alice"));
    assert!(!ctx.is_authenticated());

    let err = app
        .dispatch(&mut ctx, &mut storage, register("alice", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref msg) if msg == "username taken"));

    let err = app
        .dispatch(&mut ctx, &mut storage, login("alice", "wrong-one", false))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
    assert!(storage.get(SESSION_TOKEN_KEY).is_none());

    let view = app
        .dispatch(&mut ctx, &mut storage, login("alice", "secret1", true))
        .await
        .unwrap();
    let View::LoggedIn { token, conversations, .. } = view else {
        panic!("expected logged in view");
    };
    assert_eq!(conversations.len(), 1);
    assert_eq!(storage.get(SESSION_TOKEN_KEY).as_deref(), Some(token.as_str()));

    // A new client with the same stored token resumes silently.
    let mut restarted = SessionContext::new();
    let view = app
        .dispatch(&mut restarted, &mut storage, Command::Resume)
        .await
        .unwrap();
    assert!(matches!(view, View::Resumed { ref identity, .. } if identity.username == "alice"));

    app.dispatch(&mut restarted, &mut storage, Command::Logout)
        .await
        .unwrap();
    assert!(!restarted.is_authenticated());
    assert!(storage.get(SESSION_TOKEN_KEY).is_none());
    assert!(app.auth().resume(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn newest_login_wins() {
    let app = app().await;
    let mut setup = SessionContext::new();
    app.dispatch(&mut setup, &mut MemoryStorage::new(), register("alice", "a@example.com"))
        .await
        .unwrap();

    let mut laptop = SessionContext::new();
    let mut laptop_storage = MemoryStorage::new();
    app.dispatch(&mut laptop, &mut laptop_storage, login("alice", "secret1", true))
        .await
        .unwrap();

    let mut phone = SessionContext::new();
    let mut phone_storage = MemoryStorage::new();
    app.dispatch(&mut phone, &mut phone_storage, login("alice", "secret1", true))
        .await
        .unwrap();

    let mut laptop_again = SessionContext::new();
    let view = app
        .dispatch(&mut laptop_again, &mut laptop_storage, Command::Resume)
        .await
        .unwrap();
    assert!(matches!(view, View::Anonymous));
    assert!(laptop_storage.get(SESSION_TOKEN_KEY).is_none());

    let mut phone_again = SessionContext::new();
    let view = app
        .dispatch(&mut phone_again, &mut phone_storage, Command::Resume)
        .await
        .unwrap();
    assert!(matches!(view, View::Resumed { .. }));
}

#[tokio::test]
async fn expired_session_is_rejected_and_removed() {
    let db = memory_pool().await.unwrap();
    let chat = ChatClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    let app = App::with_chat_client(db.clone(), chrono::Duration::hours(1), chat, None);

    let mut ctx = SessionContext::new();
    let mut storage = MemoryStorage::new();
    app.dispatch(&mut ctx, &mut storage, register("alice", "a@example.com"))
        .await
        .unwrap();
    let View::LoggedIn { identity, token, .. } = app
        .dispatch(&mut ctx, &mut storage, login("alice", "secret1", false))
        .await
        .unwrap()
    else {
        panic!("expected logged in view");
    };

    let later = Utc::now() + chrono::Duration::hours(2);
    assert!(app.auth().validator().validate_at(&token, later).await.unwrap().is_none());
    assert_eq!(SessionRepository::count_for_user(&db, &identity.user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn last_conversation_is_always_replaced() {
    let app = app().await;
    let mut ctx = SessionContext::new();
    let mut storage = MemoryStorage::new();
    app.dispatch(&mut ctx, &mut storage, register("alice", "a@example.com"))
        .await
        .unwrap();
    let View::LoggedIn { current_conversation, .. } = app
        .dispatch(&mut ctx, &mut storage, login("alice", "secret1", false))
        .await
        .unwrap()
    else {
        panic!("expected logged in view");
    };

    let view = app
        .dispatch(
            &mut ctx,
            &mut storage,
            Command::DeleteConversation {
                conversation_id: current_conversation.clone(),
            },
        )
        .await
        .unwrap();
    let View::Conversations { conversations, current_conversation: now } = view else {
        panic!("expected conversations view");
    };
    assert_eq!(conversations.len(), 1);
    assert_ne!(now, current_conversation);
    assert_eq!(ctx.current_conversation.as_deref(), Some(now.as_str()));
}
