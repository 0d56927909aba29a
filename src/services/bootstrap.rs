//! Bootstrap sequencer - Migrations first, then credentials.
//!
//! The migration tree fingerprint is the caller's idempotency key: when the
//! caller passes back the fingerprint of the last successful run and the
//! tree is unchanged, migrations are skipped. Credentials are provisioned
//! only with a completion in hand, one role at a time.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use super::{CredentialProvisioner, MigrationRunner};
use crate::domain::{
    CredentialRequest, Fingerprint, Identifier, MigrationRunCompletion, MigrationSet,
    PasswordChange, ProvisionedCredential, SetStatus,
};
use crate::errors::AppResult;
use crate::infra::fingerprint_tree;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Desired state for one bootstrap run.
#[derive(Debug, Clone, Default)]
pub struct BootstrapRequest {
    /// Fingerprint of the last successful run, if the caller kept one
    pub previous_fingerprint: Option<Fingerprint>,
    pub roles: Vec<CredentialRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BootstrapOutcome {
    pub completion: MigrationRunCompletion,
    pub credentials: Vec<ProvisionedCredential>,
}

/// Bootstrap operations exposed to the invocation surfaces.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BootstrapService: Send + Sync {
    /// Check database connectivity
    async fn ping(&self) -> AppResult<()>;

    /// Current fingerprint of the migration tree
    async fn fingerprint(&self) -> AppResult<Fingerprint>;

    /// Run migrations unless `previous` matches the current fingerprint
    async fn migrate(&self, previous: Option<Fingerprint>) -> AppResult<MigrationRunCompletion>;

    /// Applied/pending state of every set
    async fn status(&self) -> AppResult<Vec<SetStatus>>;

    /// Provision one role once every migration is applied
    async fn provision(&self, request: CredentialRequest) -> AppResult<ProvisionedCredential>;

    /// Delete request for provisioned credentials
    async fn remove(&self, physical_resource_id: Option<String>) -> AppResult<()>;

    /// Change a role's password directly
    async fn change_password(&self, change: PasswordChange) -> AppResult<()>;
}

pub struct Bootstrap {
    runner: MigrationRunner,
    provisioner: CredentialProvisioner,
    migrations_root: PathBuf,
    sets: Vec<MigrationSet>,
}

impl Bootstrap {
    /// Sequence the standard migration sets under `migrations_root`.
    pub fn new(
        runner: MigrationRunner,
        provisioner: CredentialProvisioner,
        migrations_root: impl Into<PathBuf>,
        schema: &Identifier,
    ) -> AppResult<Self> {
        let migrations_root = migrations_root.into();
        let sets = MigrationSet::standard(&migrations_root, schema)?;
        Ok(Self {
            runner,
            provisioner,
            migrations_root,
            sets,
        })
    }

    pub fn sets(&self) -> &[MigrationSet] {
        &self.sets
    }

    /// Completion for a tree that is already fully applied.
    ///
    /// Fails with `MigrationsPending` instead of running anything.
    pub async fn verify_migrated(&self) -> AppResult<MigrationRunCompletion> {
        let fingerprint = self.fingerprint().await?;
        self.runner.verify(&self.sets, fingerprint).await
    }

    /// Migrate, then provision every requested role in order.
    pub async fn apply(&self, request: BootstrapRequest) -> AppResult<BootstrapOutcome> {
        let completion = self.migrate(request.previous_fingerprint).await?;

        let mut credentials = Vec::with_capacity(request.roles.len());
        for role in request.roles {
            credentials.push(self.provisioner.apply(&completion, role).await?);
        }

        Ok(BootstrapOutcome {
            completion,
            credentials,
        })
    }
}

#[async_trait]
impl BootstrapService for Bootstrap {
    async fn ping(&self) -> AppResult<()> {
        self.runner.ping().await
    }

    async fn fingerprint(&self) -> AppResult<Fingerprint> {
        fingerprint_tree(&self.migrations_root).await
    }

    async fn migrate(&self, previous: Option<Fingerprint>) -> AppResult<MigrationRunCompletion> {
        let current = self.fingerprint().await?;

        if previous.as_ref() == Some(&current) {
            tracing::info!(fingerprint = %current, "Migration tree unchanged, skipping");
            return Ok(MigrationRunCompletion::unchanged(current));
        }

        self.runner.run(&self.sets, current).await
    }

    async fn status(&self) -> AppResult<Vec<SetStatus>> {
        let mut statuses = Vec::with_capacity(self.sets.len());
        for set in &self.sets {
            statuses.push(SetStatus {
                set: set.name.clone(),
                ledger: set.ledger.to_string(),
                files: self.runner.status(set).await?,
            });
        }
        Ok(statuses)
    }

    async fn provision(&self, request: CredentialRequest) -> AppResult<ProvisionedCredential> {
        let completion = self.verify_migrated().await?;
        self.provisioner.apply(&completion, request).await
    }

    async fn remove(&self, physical_resource_id: Option<String>) -> AppResult<()> {
        self.provisioner.remove(physical_resource_id.as_deref()).await
    }

    async fn change_password(&self, change: PasswordChange) -> AppResult<()> {
        self.provisioner.change_password(change).await
    }
}
