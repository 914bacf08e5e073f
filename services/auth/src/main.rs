use anyhow::Result;
use tracing::info;

mod error;
mod hasher;
mod middleware;
mod models;
mod repositories;
mod routes;
mod service;
mod settings;
mod validation;

use common::{
    database::{self, DatabaseConfig},
    logging, schema,
    session::SessionRepository,
};
use sqlx::SqlitePool;
use tokio::net::TcpListener;

use crate::{
    hasher::Hasher, repositories::UserRepository, service::AuthService, settings::AuthSettings,
    validation::CommonPasswords,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub auth_service: AuthService,
    pub sessions: SessionRepository,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing()?;

    info!("Starting authentication service");

    let settings = AuthSettings::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;
    schema::migrate(&pool).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let common_passwords = CommonPasswords::with_extra(settings.common_passwords.iter().cloned());
    info!(
        "Loaded {} common passwords into the denylist",
        common_passwords.len()
    );

    let sessions = SessionRepository::new(pool.clone());
    let auth_service = AuthService::new(
        UserRepository::new(pool.clone()),
        sessions.clone(),
        Hasher::new()?,
        common_passwords,
        settings.session_ttl(),
    );

    let app_state = AppState {
        db_pool: pool,
        auth_service,
        sessions,
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_address).await?;
    info!("Authentication service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
