//! Shared fixtures: an in-memory Postgres fake and migration trees on disk.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use supabase_bootstrap::config::Config;
use supabase_bootstrap::domain::{DatabaseSecret, Identifier, Ledger, MigrationFile, Password};
use supabase_bootstrap::errors::{AppError, AppResult};
use supabase_bootstrap::infra::{MemorySecretStore, MigrationBackend, RoleStore};
use supabase_bootstrap::services::Services;

pub const ROOT_SECRET_ID: &str = "supabase/db-secret";
pub const JWT_SECRET_ID: &str = "supabase/jwt-secret";
pub const JWT_SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

/// SQL containing this marker fails like a syntax error would.
pub const FAILING_SQL: &str = "select FAIL;";

#[derive(Default, Clone)]
struct State {
    ledgers: HashMap<String, Vec<String>>,
    executed: Vec<String>,
    roles: HashMap<String, Option<String>>,
}

/// Single-connection Postgres stand-in.
///
/// Transactions stage their writes and commit only when every file succeeds.
#[derive(Default)]
pub struct FakePostgres {
    state: Mutex<State>,
}

impl FakePostgres {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fake with these roles already created (no password).
    pub fn with_roles(roles: &[&str]) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            for role in roles {
                state.roles.insert(role.to_string(), None);
            }
        }
        Arc::new(fake)
    }

    /// Seed ledger rows as if an earlier run had recorded them.
    pub fn record(&self, ledger: &Ledger, names: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state
            .ledgers
            .entry(ledger.qualified())
            .or_default()
            .extend(names.iter().map(|n| n.to_string()));
    }

    /// Ledger rows in insertion order.
    pub fn rows(&self, ledger: &Ledger) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .ledgers
            .get(&ledger.qualified())
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_ledger(&self, ledger: &Ledger) -> bool {
        self.state
            .lock()
            .unwrap()
            .ledgers
            .contains_key(&ledger.qualified())
    }

    /// SQL bodies that took effect, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    /// Whether `role` can log in with `password`.
    pub fn authenticate(&self, role: &str, password: &str) -> bool {
        matches!(
            self.state.lock().unwrap().roles.get(role),
            Some(Some(current)) if current == password
        )
    }

    fn execute(state: &mut State, ledger: &Ledger, file: &MigrationFile) -> AppResult<()> {
        if file.sql.contains("FAIL") {
            return Err(AppError::Migration {
                ledger: ledger.to_string(),
                migration: file.name.clone(),
                source: sea_orm::DbErr::Custom("syntax error at or near \"FAIL\"".into()),
            });
        }

        // Migrations create the roles credentials are provisioned for
        for word in file.sql.split_whitespace() {
            if let Some(role) = word.strip_prefix("role:") {
                state.roles.entry(role.to_string()).or_insert(None);
            }
        }

        state.executed.push(file.sql.clone());
        state
            .ledgers
            .get_mut(&ledger.qualified())
            .ok_or_else(|| AppError::Ledger(format!("{} does not exist", ledger)))?
            .push(file.name.clone());
        Ok(())
    }
}

#[async_trait]
impl MigrationBackend for FakePostgres {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn ensure_ledger(&self, ledger: &Ledger) -> AppResult<()> {
        self.state
            .lock()
            .unwrap()
            .ledgers
            .entry(ledger.qualified())
            .or_default();
        Ok(())
    }

    async fn ledger_exists(&self, ledger: &Ledger) -> AppResult<bool> {
        Ok(self.has_ledger(ledger))
    }

    async fn high_water_mark(&self, ledger: &Ledger) -> AppResult<Option<String>> {
        let state = self.state.lock().unwrap();
        let rows = state
            .ledgers
            .get(&ledger.qualified())
            .ok_or_else(|| AppError::Ledger(format!("{} does not exist", ledger)))?;
        Ok(rows.iter().max_by(|a, b| a.as_bytes().cmp(b.as_bytes())).cloned())
    }

    async fn apply_in_transaction(&self, ledger: &Ledger, files: &[MigrationFile]) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let mut staged = state.clone();
        for file in files {
            Self::execute(&mut staged, ledger, file)?;
        }
        *state = staged;
        Ok(())
    }

    async fn apply_autocommit(&self, ledger: &Ledger, file: &MigrationFile) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::execute(&mut state, ledger, file)
    }
}

#[async_trait]
impl RoleStore for FakePostgres {
    async fn set_password(&self, role: &Identifier, password: &Password) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        match state.roles.get_mut(role.as_str()) {
            Some(current) => {
                *current = Some(password.expose().to_string());
                Ok(())
            }
            None => Err(AppError::Database(sea_orm::DbErr::Custom(format!(
                "role \"{}\" does not exist",
                role
            )))),
        }
    }
}

/// A migration tree in a temporary directory.
pub struct MigrationTree {
    dir: TempDir,
}

impl MigrationTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn folder(&self, set: &str) -> PathBuf {
        self.dir.path().join(set)
    }

    /// Write `<root>/<set>/<name>`.
    pub fn write(&self, set: &str, name: &str, sql: &str) -> &Self {
        let folder = self.folder(set);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(name), sql).unwrap();
        self
    }
}

pub fn ledger(table: &str) -> Ledger {
    Ledger::new(
        Identifier::parse("drizzle").unwrap(),
        Identifier::parse(table).unwrap(),
    )
}

pub fn root_secret() -> DatabaseSecret {
    DatabaseSecret::from_value(ROOT_SECRET_ID, root_secret_value()).unwrap()
}

pub fn root_secret_value() -> serde_json::Value {
    json!({
        "engine": "postgres",
        "host": "db.internal",
        "port": "5432",
        "username": "postgres",
        "password": "root-pass",
        "dbname": "postgres"
    })
}

pub fn config(tree: &MigrationTree) -> Config {
    Config {
        migrations_dir: tree.path().to_path_buf(),
        ..Config::default()
    }
}

/// Secret store seeded with the root and signing secrets.
pub async fn secrets() -> Arc<MemorySecretStore> {
    let store = Arc::new(MemorySecretStore::new());
    store.insert(ROOT_SECRET_ID, root_secret_value()).await;
    store.insert(JWT_SECRET_ID, json!(JWT_SECRET)).await;
    store
}

/// Services wired to the fake database.
pub fn services(tree: &MigrationTree, db: Arc<FakePostgres>, secrets: Arc<MemorySecretStore>) -> Services {
    Services::from_parts(&config(tree), db.clone(), db, secrets, root_secret()).unwrap()
}
