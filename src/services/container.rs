//! Service Container - Wires the bootstrap services from configuration.

use std::sync::Arc;

use super::{Bootstrap, BootstrapService, CredentialProvisioner, MigrationRunner, TokenIssuer, TokenService};
use crate::config::Config;
use crate::domain::{DatabaseSecret, Identifier};
use crate::errors::AppResult;
use crate::infra::{require_secret, Database, MigrationBackend, RoleStore, SecretStore};

/// Concrete service container shared by the CLI and the HTTP server.
pub struct Services {
    bootstrap: Arc<Bootstrap>,
    tokens: Arc<dyn TokenService>,
}

impl Services {
    /// Resolve the root secret, connect as root admin and build every service.
    ///
    /// Secret resolution happens before the database is touched.
    pub async fn connect(config: &Config, secrets: Arc<dyn SecretStore>) -> AppResult<Self> {
        let root = load_root_secret(secrets.as_ref(), &config.db_secret_id).await?;
        let database = Arc::new(Database::connect(&root.admin_descriptor(), config.connect_timeout).await?);

        Self::from_parts(config, database.clone(), database, secrets, root)
    }

    /// Build from explicit collaborators.
    pub fn from_parts(
        config: &Config,
        backend: Arc<dyn MigrationBackend>,
        roles: Arc<dyn RoleStore>,
        secrets: Arc<dyn SecretStore>,
        root: DatabaseSecret,
    ) -> AppResult<Self> {
        let schema = Identifier::parse(config.migrations_schema.clone())?;

        let runner = MigrationRunner::new(backend);
        let provisioner = CredentialProvisioner::new(roles, secrets.clone(), root);
        let bootstrap = Bootstrap::new(runner, provisioner, &config.migrations_dir, &schema)?;
        let tokens = TokenIssuer::new(secrets, config.jwt_secret_id.clone());

        Ok(Self {
            bootstrap: Arc::new(bootstrap),
            tokens: Arc::new(tokens),
        })
    }

    /// Concrete sequencer, for callers that need the full pipeline.
    pub fn bootstrap(&self) -> Arc<Bootstrap> {
        self.bootstrap.clone()
    }

    pub fn bootstrap_service(&self) -> Arc<dyn BootstrapService> {
        self.bootstrap.clone()
    }

    pub fn tokens(&self) -> Arc<dyn TokenService> {
        self.tokens.clone()
    }
}

/// Read and decode the root admin secret.
pub async fn load_root_secret(secrets: &dyn SecretStore, id: &str) -> AppResult<DatabaseSecret> {
    let value = require_secret(secrets, id).await?;
    DatabaseSecret::from_value(id, value)
}
