//! Schema bootstrap for the platform database
//!
//! Tables are created with `IF NOT EXISTS`, so every service can run
//! [`migrate`] at start-up against the shared database.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DatabaseError, DatabaseResult};

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT DEFAULT 'user'
    )
"#;

const CREATE_SESSIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        username TEXT NOT NULL REFERENCES users(username) ON UPDATE CASCADE ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )
"#;

const CREATE_CYBER_INCIDENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS cyber_incidents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT,
        incident_type TEXT,
        severity TEXT,
        status TEXT,
        description TEXT,
        reported_by TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

const CREATE_DATASETS_METADATA: &str = r#"
    CREATE TABLE IF NOT EXISTS datasets_metadata (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        dataset_name TEXT NOT NULL,
        category TEXT,
        source TEXT,
        last_updated TEXT,
        record_count INTEGER,
        file_size_mb REAL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

const CREATE_IT_TICKETS: &str = r#"
    CREATE TABLE IF NOT EXISTS it_tickets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ticket_id TEXT UNIQUE NOT NULL,
        priority TEXT,
        status TEXT,
        category TEXT,
        subject TEXT NOT NULL,
        description TEXT,
        created_date TEXT,
        resolved_date TEXT,
        assigned_to TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Every table of the platform, in creation order
const TABLES: [(&str, &str); 5] = [
    ("users", CREATE_USERS),
    ("sessions", CREATE_SESSIONS),
    ("cyber_incidents", CREATE_CYBER_INCIDENTS),
    ("datasets_metadata", CREATE_DATASETS_METADATA),
    ("it_tickets", CREATE_IT_TICKETS),
];

/// Create all tables that do not exist yet
pub async fn migrate(pool: &SqlitePool) -> DatabaseResult<()> {
    for (name, ddl) in TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::Migration(format!("{}: {}", name, e)))?;
        info!("Table {} ready", name);
    }

    Ok(())
}
