//! Supply restock platform - backend server

use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restock_backend::{
    config::StorageBackend,
    create_app,
    services::{notification::LineMessagingClient, LineNotifier, Notifier, TracingNotifier},
    store::{MemoryStore, PgStore, Stores},
    AppError, AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "restock_server=debug,restock_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Supply Restock Server");
    tracing::info!("Environment: {}", config.environment);

    let (stores, notifier): (Stores, Arc<dyn Notifier>) = match config.storage.backend {
        StorageBackend::Postgres => {
            if config.database.url.is_empty() {
                return Err(AppError::Configuration(
                    "database.url is required for the postgres backend".to_string(),
                )
                .into());
            }

            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            let notifier: Arc<dyn Notifier> = match &config.line.channel_access_token {
                Some(token) => Arc::new(LineNotifier::new(
                    db_pool.clone(),
                    LineMessagingClient::new(
                        token.clone(),
                        Duration::from_secs(config.line.request_timeout_secs),
                    )?,
                )),
                None => Arc::new(TracingNotifier),
            };
            (Stores::postgres(PgStore::new(db_pool)), notifier)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            (
                Stores::memory(Arc::new(MemoryStore::default())),
                Arc::new(TracingNotifier),
            )
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let app = create_app(AppState::new(config, stores, notifier));

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
