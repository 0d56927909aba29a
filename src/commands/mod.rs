//! Commands module - CLI command implementations.
//!
//! Each command is implemented in its own module for separation of concerns.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{FileSecretStore, SecretStore};
use crate::services::Services;

pub mod bootstrap;
pub mod credentials;
pub mod migrate;
pub mod serve;
pub mod token;

/// Secret store rooted at the configured directory.
fn secret_store(config: &Config) -> Arc<dyn SecretStore> {
    Arc::new(FileSecretStore::new(config.secrets_dir.clone()))
}

/// Resolve the root secret and connect every service.
async fn connect(config: &Config) -> AppResult<Services> {
    Services::connect(config, secret_store(config)).await
}

/// Write a result to stdout as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Output encoding failed: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
