//! User repository for database operations

use common::{
    authz::Role,
    error::{DatabaseError, DatabaseResult},
};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::{info, warn};

use crate::models::{NewUser, User, UserSummary};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

fn parse_role(username: &str, stored: Option<String>) -> Role {
    match stored {
        Some(name) => name.parse().unwrap_or_else(|e| {
            warn!("{} stored for user {}, treating as user", e, username);
            Role::User
        }),
        None => Role::User,
    }
}

fn user_from_row(row: &SqliteRow) -> DatabaseResult<User> {
    let username: String = row.try_get("username").map_err(DatabaseError::Query)?;
    let role = parse_role(&username, row.try_get("role").map_err(DatabaseError::Query)?);

    Ok(User {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        password_hash: row.try_get("password_hash").map_err(DatabaseError::Query)?,
        username,
        role,
    })
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user
    ///
    /// A taken username surfaces as [`DatabaseError::UniqueViolation`].
    pub async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            role: new_user.role,
        })
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        info!("Finding user by username: {}", username);

        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, role
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Whether a username is taken
    pub async fn exists(&self, username: &str) -> DatabaseResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(count > 0)
    }

    /// Number of users holding a role
    pub async fn count_with_role(&self, role: Role) -> DatabaseResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Stored role of a user
    pub async fn get_role(&self, username: &str) -> DatabaseResult<Option<Role>> {
        let row = sqlx::query("SELECT role FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        match row {
            Some(row) => {
                let stored: Option<String> = row.try_get("role").map_err(DatabaseError::Query)?;
                Ok(Some(parse_role(username, stored)))
            }
            None => Ok(None),
        }
    }

    /// Replace a user's password hash, returning the number of rows updated
    pub async fn update_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> DatabaseResult<u64> {
        info!("Updating password for user: {}", username);

        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE username = ?")
            .bind(password_hash)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected())
    }

    /// Change a user's role, returning the number of rows updated
    pub async fn update_role(&self, username: &str, role: Role) -> DatabaseResult<u64> {
        info!("Setting role of user {} to {}", username, role);

        let result = sqlx::query("UPDATE users SET role = ? WHERE username = ?")
            .bind(role.as_str())
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected())
    }

    /// Get all users without their password hashes
    pub async fn get_all(&self) -> DatabaseResult<Vec<UserSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, role
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter()
            .map(|row| {
                let username: String = row.try_get("username").map_err(DatabaseError::Query)?;
                let stored: Option<String> = row.try_get("role").map_err(DatabaseError::Query)?;
                let role = parse_role(&username, stored);
                Ok(UserSummary {
                    id: row.try_get("id").map_err(DatabaseError::Query)?,
                    username,
                    role,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::memory_pool;

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = UserRepository::new(memory_pool().await.unwrap());

        let created = repo.create(&new_user("Alice", Role::Analyst)).await.unwrap();
        let found = repo.find_by_username("Alice").await.unwrap().unwrap();

        assert_eq!(created, found);
        assert!(repo.exists("Alice").await.unwrap());
        assert!(!repo.exists("Bob").await.unwrap());
        assert!(repo.find_by_username("Bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let repo = UserRepository::new(memory_pool().await.unwrap());
        repo.create(&new_user("Alice", Role::User)).await.unwrap();

        let err = repo.create(&new_user("Alice", Role::Admin)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_updates_report_affected_rows() {
        let repo = UserRepository::new(memory_pool().await.unwrap());
        repo.create(&new_user("Alice", Role::User)).await.unwrap();

        assert_eq!(repo.update_password_hash("Alice", "new").await.unwrap(), 1);
        assert_eq!(repo.update_password_hash("Nobody", "new").await.unwrap(), 0);
        assert_eq!(repo.update_role("Alice", Role::Admin).await.unwrap(), 1);
        assert_eq!(repo.get_role("Alice").await.unwrap(), Some(Role::Admin));
        assert_eq!(repo.get_role("Nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_all_lists_in_insertion_order() {
        let repo = UserRepository::new(memory_pool().await.unwrap());
        repo.create(&new_user("Alice", Role::Admin)).await.unwrap();
        repo.create(&new_user("Bob", Role::User)).await.unwrap();

        let users = repo.get_all().await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(users[0].role, Role::Admin);
        assert_eq!(repo.count_with_role(Role::Admin).await.unwrap(), 1);
        assert_eq!(repo.count_with_role(Role::Analyst).await.unwrap(), 0);
    }
}
