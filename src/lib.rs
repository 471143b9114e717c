pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::config::DbConfig;
use crate::db::{DatabaseProxy, DbInitError};
use crate::services::email_provider::EmailService;
use crate::services::ServiceError;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database initialization failed: {0}")]
    Database(#[from] DbInitError),
    #[error("catalog seeding failed: {0}")]
    Seed(#[from] ServiceError),
}

pub async fn create_app(config: Config) -> Result<axum::Router, StartupError> {
    create_app_with(config, EmailService::from_env()).await
}

/// Builds the full application with an explicit email service, connecting,
/// migrating and optionally seeding the database first.
pub async fn create_app_with(
    config: Config,
    email_service: EmailService,
) -> Result<axum::Router, StartupError> {
    let db_proxy = DatabaseProxy::connect_and_migrate(DbConfig::from_config(&config)).await?;

    if config.seed_catalog {
        seed::seed_catalog(&db_proxy).await?;
    }

    tracing::info!(
        provider = ?email_service.provider_type(),
        available = email_service.is_available(),
        "email service configured"
    );

    let state = AppState::new(config, db_proxy, email_service);

    Ok(routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
