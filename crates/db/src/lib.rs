//! Persistence layer for enterprises, users, groups, releases, and
//! fiscal periods.
//!
//! `SeaORM` entities live in [`entities`], schema migrations in
//! [`migration`], and the repository types that enforce tenancy and
//! period locking in [`repositories`].

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    EnterpriseRepository, GroupRepository, PeriodRepository, ReleaseRepository, UserRepository,
};

use notara_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection from a bare database URL.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a connection with pool sizing taken from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections);
    Database::connect(options).await
}
