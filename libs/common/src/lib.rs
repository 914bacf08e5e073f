//! Common library for the Multi-Domain Intelligence Platform
//!
//! This crate provides shared functionality used across the platform
//! services: database connectivity and schema, error handling, roles and
//! authorization, per-session context, and logging setup.

pub mod authz;
pub mod database;
pub mod error;
pub mod logging;
pub mod schema;
pub mod session;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, health_check, init_pool};
/// use common::schema::migrate;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     migrate(&pool).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
