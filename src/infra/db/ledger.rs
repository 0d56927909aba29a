//! Migration ledger access and migration application on Postgres.

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseTransaction, FromQueryResult, Statement,
    TransactionTrait,
};

use super::Database;
use crate::domain::{Ledger, MigrationFile};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Storage side of the migration runner.
///
/// The runner decides *what* to apply; implementations decide how a unit of
/// work is committed.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MigrationBackend: Send + Sync {
    /// Check the backend is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Create the ledger schema and table if absent
    async fn ensure_ledger(&self, ledger: &Ledger) -> AppResult<()>;

    /// Whether the ledger table exists, without creating it
    async fn ledger_exists(&self, ledger: &Ledger) -> AppResult<bool>;

    /// Greatest recorded migration name, if any
    async fn high_water_mark(&self, ledger: &Ledger) -> AppResult<Option<String>>;

    /// Apply and record every file in one transaction; all or nothing
    async fn apply_in_transaction(&self, ledger: &Ledger, files: &[MigrationFile]) -> AppResult<()>;

    /// Apply and record one file without an enclosing transaction
    async fn apply_autocommit(&self, ledger: &Ledger, file: &MigrationFile) -> AppResult<()>;
}

#[derive(Debug, FromQueryResult)]
struct LedgerName {
    name: String,
}

#[derive(Debug, FromQueryResult)]
struct Presence {
    present: bool,
}

/// Insert the ledger row for `name`.
async fn record<C: ConnectionTrait>(conn: &C, ledger: &Ledger, name: &str) -> AppResult<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        format!(r#"insert into {} ("name") values ($1)"#, ledger.qualified()),
        [name.into()],
    ))
    .await
    .map_err(|source| AppError::Migration {
        ledger: ledger.to_string(),
        migration: name.to_string(),
        source,
    })?;
    Ok(())
}

/// Execute a file's SQL verbatim, then record it.
async fn apply_file<C: ConnectionTrait>(conn: &C, ledger: &Ledger, file: &MigrationFile) -> AppResult<()> {
    tracing::info!(ledger = %ledger, "Applying migration {}", file.name);

    conn.execute_unprepared(&file.sql)
        .await
        .map_err(|source| AppError::Migration {
            ledger: ledger.to_string(),
            migration: file.name.clone(),
            source,
        })?;
    record(conn, ledger, &file.name).await?;

    tracing::info!(ledger = %ledger, "Applied migration {}", file.name);
    Ok(())
}

async fn apply_all(txn: &DatabaseTransaction, ledger: &Ledger, files: &[MigrationFile]) -> AppResult<()> {
    for file in files {
        apply_file(txn, ledger, file).await?;
    }
    Ok(())
}

#[async_trait]
impl MigrationBackend for Database {
    async fn ping(&self) -> AppResult<()> {
        Database::ping(self).await
    }

    async fn ensure_ledger(&self, ledger: &Ledger) -> AppResult<()> {
        let conn = self.connection();

        conn.execute_unprepared(&format!(
            "create schema if not exists {}",
            ledger.schema.quoted()
        ))
        .await?;
        conn.execute_unprepared(&format!(
            r#"create table if not exists {} (
                "id" serial primary key,
                "name" text not null
            )"#,
            ledger.qualified()
        ))
        .await?;

        Ok(())
    }

    async fn ledger_exists(&self, ledger: &Ledger) -> AppResult<bool> {
        let row = Presence::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "select to_regclass($1) is not null as present",
            [ledger.qualified().into()],
        ))
        .one(self.connection())
        .await?;

        Ok(row.map(|r| r.present).unwrap_or(false))
    }

    async fn high_water_mark(&self, ledger: &Ledger) -> AppResult<Option<String>> {
        // "C" collation compares bytes, matching the order files are applied in
        let row = LedgerName::find_by_statement(Statement::from_string(
            DatabaseBackend::Postgres,
            format!(
                r#"select "name" from {} order by "name" collate "C" desc limit 1"#,
                ledger.qualified()
            ),
        ))
        .one(self.connection())
        .await
        .map_err(|e| AppError::Ledger(format!("reading {} failed: {}", ledger, e)))?;

        Ok(row.map(|r| r.name))
    }

    async fn apply_in_transaction(&self, ledger: &Ledger, files: &[MigrationFile]) -> AppResult<()> {
        let txn = self.connection().begin().await?;

        match apply_all(&txn, ledger, files).await {
            Ok(()) => {
                txn.commit().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn apply_autocommit(&self, ledger: &Ledger, file: &MigrationFile) -> AppResult<()> {
        apply_file(self.connection(), ledger, file).await
    }
}
