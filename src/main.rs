use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frejus_chat::{
    api::{create_router, AppState},
    app::App,
    config::Config,
    db,
    error::AppError,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,frejus_chat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Frejus chat server v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("Configuration loaded");

    // Connect and migrate
    let db = db::connect(&config).await?;
    tracing::info!("Database ready: {}", config.database_url);

    if config.chat_api_key.is_none() {
        tracing::warn!("CHAT_API_KEY not set; users must supply their own key");
    }

    let app = App::new(db, &config)?;
    tracing::info!("Chat endpoint: {} (default model {})", config.chat_api_url, config.chat_model);

    // Build router
    let router = create_router(AppState {
        app,
        config: config.clone(),
    });

    // Bind and serve
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check: http://{}/api/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
