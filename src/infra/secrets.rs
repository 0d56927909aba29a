//! Secret store abstraction and implementations.
//!
//! Secrets are JSON documents addressed by `/`-separated identifiers such as
//! `supabase/prod/DBUser/authenticator`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Secret store trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read a secret; `None` if it does not exist
    async fn find(&self, id: &str) -> AppResult<Option<Value>>;

    /// Create or replace a secret
    async fn put(&self, id: &str, value: &Value) -> AppResult<()>;
}

/// Read a secret that must exist.
pub async fn require_secret(store: &dyn SecretStore, id: &str) -> AppResult<Value> {
    store
        .find(id)
        .await?
        .ok_or_else(|| AppError::secret(id, "not found"))
}

/// File-backed store: one JSON document per secret under a root directory.
pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an identifier to `<root>/<segment>/.../<last>.json`.
    fn path_for(&self, id: &str) -> AppResult<PathBuf> {
        let segments: Vec<&str> = id.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(AppError::secret(id, "empty secret identifier"));
        }

        let mut path = self.root.clone();
        for (index, segment) in segments.iter().enumerate() {
            let valid = segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
                && matches!(Path::new(segment).components().next(), Some(Component::Normal(_)));
            if !valid {
                return Err(AppError::secret(
                    id,
                    format!("invalid identifier segment {:?}", segment),
                ));
            }
            if index + 1 == segments.len() {
                path.push(format!("{}.json", segment));
            } else {
                path.push(segment);
            }
        }
        Ok(path)
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn find(&self, id: &str) -> AppResult<Option<Value>> {
        let path = self.path_for(id)?;

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::secret(id, e.to_string())),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::secret(id, format!("not valid JSON: {}", e)))
    }

    async fn put(&self, id: &str, value: &Value) -> AppResult<()> {
        let path = self.path_for(id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::internal(format!("Secret encoding failed: {}", e)))?;

        // Readers never observe a half-written secret
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &path).await?;

        tracing::debug!(secret_id = id, "Secret written");
        Ok(())
    }
}

/// In-process store for dry runs and tests.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, Value>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a secret.
    pub async fn insert(&self, id: impl Into<String>, value: Value) {
        self.secrets.write().await.insert(id.into(), value);
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn find(&self, id: &str) -> AppResult<Option<Value>> {
        Ok(self.secrets.read().await.get(id).cloned())
    }

    async fn put(&self, id: &str, value: &Value) -> AppResult<()> {
        self.secrets.write().await.insert(id.to_string(), value.clone());
        Ok(())
    }
}
