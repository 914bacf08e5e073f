use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

mod chat;
mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod settings;
mod state;

use assistant::{AssistantConfig, ChatClient};
use common::{
    database::{self, DatabaseConfig},
    logging, schema,
};
use tokio::net::TcpListener;

use crate::{settings::RecordsSettings, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing()?;

    info!("Starting records service");

    let settings = RecordsSettings::load()?;

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

    let assistant = match AssistantConfig::from_env() {
        Some(config) => {
            info!("Chat assistants enabled with model {}", config.model);
            Some(ChatClient::new(config))
        }
        None => {
            warn!("OPENAI_API_KEY is not set, chat assistants are disabled");
            None
        }
    };

    let app_state = AppState::new(pool, assistant);
    spawn_chat_pruning(&app_state, settings.chat_prune_interval_secs);

    info!("Records service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_address).await?;
    info!("Records service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop chat histories whose session expired or was closed
fn spawn_chat_pruning(state: &AppState, interval_secs: u64) {
    let chats = state.chats.clone();
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            if let Err(e) = chats.prune(&sessions).await {
                warn!("Failed to prune chat histories: {}", e);
            }
        }
    });
}
