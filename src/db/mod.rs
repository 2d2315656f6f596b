pub mod models;
pub mod users;
pub mod sessions;
pub mod conversations;
pub mod messages;

pub use models::{Conversation, MessageRow, SessionRecord, User};
pub use users::UserRepository;
pub use sessions::SessionRepository;
pub use conversations::ConversationRepository;
pub use messages::MessageRepository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::error::AppError;

/// Connection settings for `DATABASE_URL`. The store timeout bounds both pool
/// acquisition and waits on a locked database.
pub fn connect_options(config: &Config) -> Result<SqliteConnectOptions, AppError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .busy_timeout(config.store_timeout());

    Ok(options)
}

/// Open the configured database and bring its schema up to date.
pub async fn connect(config: &Config) -> Result<Pool<Sqlite>, AppError> {
    let db = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(config.store_timeout())
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options(config)?)
        .await?;

    sqlx::migrate!("./migrations").run(&db).await?;

    Ok(db)
}

/// A private in-memory database with the schema applied.
///
/// Every SQLite `:memory:` connection is its own database, so the pool is
/// pinned to a single connection that never idles out.
pub async fn memory_pool() -> Result<Pool<Sqlite>, AppError> {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&db).await?;

    Ok(db)
}
