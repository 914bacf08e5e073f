//! Integration tests for the infrastructure components
//!
//! These tests verify that the shared SQLite database can be opened, that the
//! schema is created, and that sessions resolve against stored users.

use chrono::Duration;
use common::{
    authz::{Action, Role},
    database::{DatabaseConfig, health_check, init_pool},
    schema::migrate,
    session::SessionRepository,
};
use sqlx::Row;

/// Test that verifies the database is accessible and sessions work end to end
#[tokio::test]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "SQLite simple query test failed");

    migrate(&pool).await?;

    sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
        .bind("Carol")
        .bind("digest")
        .bind("admin")
        .execute(&pool)
        .await?;

    let sessions = SessionRepository::new(pool.clone());
    let session = sessions.create("Carol", Role::Admin, Duration::minutes(30)).await?;

    let resolved = sessions
        .resolve(session.token)
        .await?
        .ok_or("session should resolve")?;
    assert_eq!(resolved.role, Role::Admin);
    assert!(resolved.require(Action::ManageRoles).is_ok());

    assert!(sessions.delete(session.token).await?);
    assert!(sessions.resolve(session.token).await?.is_none());

    Ok(())
}

/// Sessions cannot be opened for users that do not exist
#[tokio::test]
async fn test_session_requires_existing_user() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;
    migrate(&pool).await?;

    let sessions = SessionRepository::new(pool);
    let result = sessions.create("Ghost", Role::User, Duration::minutes(5)).await;
    assert!(result.is_err(), "foreign key should reject unknown user");

    Ok(())
}
