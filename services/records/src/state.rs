//! Application state shared across handlers

use assistant::ChatClient;
use common::session::SessionRepository;
use sqlx::SqlitePool;

use crate::{
    chat::ChatStore,
    repositories::{DatasetRepository, IncidentRepository, TicketRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub sessions: SessionRepository,
    pub incidents: IncidentRepository,
    pub datasets: DatasetRepository,
    pub tickets: TicketRepository,
    /// `None` when no API key is configured
    pub assistant: Option<ChatClient>,
    pub chats: ChatStore,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, assistant: Option<ChatClient>) -> Self {
        Self {
            sessions: SessionRepository::new(db_pool.clone()),
            incidents: IncidentRepository::new(db_pool.clone()),
            datasets: DatasetRepository::new(db_pool.clone()),
            tickets: TicketRepository::new(db_pool.clone()),
            db_pool,
            assistant,
            chats: ChatStore::new(),
        }
    }
}
