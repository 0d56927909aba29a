//! Database connection and initialization.

use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, Statement,
};

use crate::domain::ConnectionDescriptor;
use crate::errors::{AppError, AppResult};

pub mod ledger;
pub mod roles;

pub use ledger::MigrationBackend;
pub use roles::RoleStore;

#[cfg(any(test, feature = "test-utils"))]
pub use ledger::MockMigrationBackend;
#[cfg(any(test, feature = "test-utils"))]
pub use roles::MockRoleStore;

/// Database wrapper for connection management.
///
/// Holds a single connection: the bootstrap is a single writer and every
/// statement is awaited in order.
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Connect as the user described by `descriptor`.
    pub async fn connect(descriptor: &ConnectionDescriptor, timeout: Duration) -> AppResult<Self> {
        let mut options = ConnectOptions::new(descriptor.uri());
        options
            .max_connections(1)
            .min_connections(1)
            .connect_timeout(timeout)
            // Statement logging would print ALTER ROLE passwords
            .sqlx_logging(false);

        let connection = SeaDatabase::connect(options).await.map_err(|e| {
            AppError::Connectivity(format!(
                "{}:{}/{} as {}: {}",
                descriptor.host, descriptor.port, descriptor.dbname, descriptor.username, e
            ))
        })?;

        tracing::info!(
            host = %descriptor.host,
            port = descriptor.port,
            dbname = %descriptor.dbname,
            "Connected to PostgreSQL database"
        );

        Ok(Self { connection })
    }

    /// Wrap an existing connection.
    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Get a reference to the database connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Check database connectivity by executing a simple query.
    pub async fn ping(&self) -> AppResult<()> {
        self.connection
            .execute(Statement::from_string(
                self.connection.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await
            .map_err(|e| AppError::Connectivity(e.to_string()))?;
        Ok(())
    }
}
