//! Application settings loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECONDS, DEFAULT_DB_SECRET_ID, DEFAULT_JWT_SECRET_ID,
    DEFAULT_MIGRATIONS_DIR, DEFAULT_MIGRATIONS_SCHEMA, DEFAULT_SECRETS_DIR, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT,
};

/// Application configuration.
///
/// Holds secret *identifiers* only; secret values are resolved from the
/// secret store at invocation time.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_secret_id: String,
    pub jwt_secret_id: String,
    pub secrets_dir: PathBuf,
    pub migrations_dir: PathBuf,
    pub migrations_schema: String,
    pub connect_timeout: Duration,
    pub server_host: String,
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_secret_id: DEFAULT_DB_SECRET_ID.to_string(),
            jwt_secret_id: DEFAULT_JWT_SECRET_ID.to_string(),
            secrets_dir: PathBuf::from(DEFAULT_SECRETS_DIR),
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            migrations_schema: DEFAULT_MIGRATIONS_SCHEMA.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl Config {
    /// Load configuration from `.env` and environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            db_secret_id: env::var("DB_SECRET_ID").unwrap_or(defaults.db_secret_id),
            jwt_secret_id: env::var("JWT_SECRET_ID").unwrap_or(defaults.jwt_secret_id),
            secrets_dir: env::var("SECRET_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.secrets_dir),
            migrations_dir: env::var("MIGRATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.migrations_dir),
            migrations_schema: env::var("MIGRATIONS_SCHEMA")
                .unwrap_or(defaults.migrations_schema),
            connect_timeout: env::var("DB_CONNECT_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        secrets_dir: Option<PathBuf>,
        migrations_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = secrets_dir {
            self.secrets_dir = dir;
        }
        if let Some(dir) = migrations_dir {
            self.migrations_dir = dir;
        }
        self
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_paths() {
        let config = Config::default().with_overrides(
            Some(PathBuf::from("/run/secrets")),
            Some(PathBuf::from("/srv/migrations")),
        );

        assert_eq!(config.secrets_dir, PathBuf::from("/run/secrets"));
        assert_eq!(config.migrations_dir, PathBuf::from("/srv/migrations"));
        assert_eq!(config.migrations_schema, DEFAULT_MIGRATIONS_SCHEMA);
    }

    #[test]
    fn test_server_addr() {
        let config = Config::default();
        assert_eq!(config.server_addr(), "0.0.0.0:3000");
    }
}
