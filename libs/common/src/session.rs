//! Per-session context and its storage
//!
//! A session is created at login and identified by an opaque token. Handlers
//! receive a [`SessionContext`] instead of reading ambient state.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    authz::{Action, Forbidden, Role, authorize},
    error::{DatabaseError, DatabaseResult},
};

/// Identity and authorization facts for one logged-in session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub token: Uuid,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl SessionContext {
    /// Fail with [`Forbidden`] unless this session's role may perform `action`
    pub fn require(&self, action: Action) -> Result<(), Forbidden> {
        if authorize(self.role, action) {
            Ok(())
        } else {
            warn!(
                "User {} with role {} denied {:?}",
                self.username, self.role, action
            );
            Err(Forbidden {
                role: self.role,
                action,
            })
        }
    }
}

/// Session repository for database operations
#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a session for an existing user
    pub async fn create(
        &self,
        username: &str,
        role: Role,
        ttl: Duration,
    ) -> DatabaseResult<SessionContext> {
        if let Err(e) = self.delete_expired().await {
            warn!("Failed to remove expired sessions: {}", e);
        }

        let token = Uuid::new_v4();
        let now = Utc::now();
        let expires_at = now + ttl;

        sqlx::query(
            r#"
            INSERT INTO sessions (token, username, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(token.to_string())
        .bind(username)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        info!("Session opened for user: {}", username);

        Ok(SessionContext {
            token,
            username: username.to_string(),
            role,
            expires_at,
        })
    }

    /// Look up a live session; expired sessions are removed and yield `None`
    pub async fn resolve(&self, token: Uuid) -> DatabaseResult<Option<SessionContext>> {
        let row = sqlx::query(
            r#"
            SELECT s.username, s.expires_at, u.role
            FROM sessions s
            JOIN users u ON u.username = s.username
            WHERE s.token = ?
            "#,
        )
        .bind(token.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: DateTime<Utc> =
            row.try_get("expires_at").map_err(DatabaseError::Query)?;
        if expires_at <= Utc::now() {
            info!("Session expired, removing");
            self.delete(token).await?;
            return Ok(None);
        }

        let username: String = row.try_get("username").map_err(DatabaseError::Query)?;
        let role: Option<String> = row.try_get("role").map_err(DatabaseError::Query)?;
        let role = match role {
            Some(name) => name.parse().unwrap_or_else(|e| {
                warn!("{} stored for user {}, treating as user", e, username);
                Role::User
            }),
            None => Role::User,
        };

        Ok(Some(SessionContext {
            token,
            username,
            role,
            expires_at,
        }))
    }

    /// Resolve a bearer token as sent by a client; malformed tokens yield `None`
    pub async fn resolve_bearer(&self, token: &str) -> DatabaseResult<Option<SessionContext>> {
        match Uuid::parse_str(token.trim()) {
            Ok(token) => self.resolve(token).await,
            Err(_) => Ok(None),
        }
    }

    /// Close a session, returning whether it existed
    pub async fn delete(&self, token: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every expired session, returning how many went
    pub async fn delete_expired(&self) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        if result.rows_affected() > 0 {
            info!("Removed {} expired sessions", result.rows_affected());
        }
        Ok(result.rows_affected())
    }

    /// Close every session of a user, optionally sparing one
    pub async fn delete_for_user(
        &self,
        username: &str,
        except: Option<Uuid>,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE username = ? AND token != ?")
            .bind(username)
            .bind(except.map(|t| t.to_string()).unwrap_or_default())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected())
    }
}
