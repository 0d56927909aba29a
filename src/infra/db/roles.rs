//! Role password management.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, Statement};

use super::Database;
use crate::domain::{Identifier, Password};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Set the login password of an existing role
    async fn set_password(&self, role: &Identifier, password: &Password) -> AppResult<()>;
}

#[derive(Debug, FromQueryResult)]
struct RenderedStatement {
    statement: String,
}

#[async_trait]
impl RoleStore for Database {
    async fn set_password(&self, role: &Identifier, password: &Password) -> AppResult<()> {
        // ALTER ROLE takes no bind parameters; let the server quote both values
        let rendered = RenderedStatement::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "select format('ALTER ROLE %I WITH PASSWORD %L', $1::text, $2::text) as statement",
            [role.as_str().into(), password.expose().into()],
        ))
        .one(self.connection())
        .await?
        .ok_or_else(|| AppError::internal("format() returned no row"))?;

        self.connection()
            .execute_unprepared(&rendered.statement)
            .await?;

        tracing::info!(role = %role, "Role password updated");
        Ok(())
    }
}
