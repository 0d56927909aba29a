//! Credential provisioner - Sets role passwords and publishes connection secrets.

use std::sync::Arc;

use crate::domain::{
    CredentialRequest, CredentialSecret, DatabaseSecret, MigrationRunCompletion, Password,
    PasswordChange, ProvisionedCredential, SslMode,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{RoleStore, SecretStore};

/// Provisions per-role credentials from the root admin secret.
pub struct CredentialProvisioner {
    roles: Arc<dyn RoleStore>,
    secrets: Arc<dyn SecretStore>,
    root: DatabaseSecret,
}

impl CredentialProvisioner {
    pub fn new(roles: Arc<dyn RoleStore>, secrets: Arc<dyn SecretStore>, root: DatabaseSecret) -> Self {
        Self {
            roles,
            secrets,
            root,
        }
    }

    /// Set the role's password and publish its connection secret.
    ///
    /// Requires proof that migrations ran, since they create the roles.
    /// The password is altered before anything is published; a failed
    /// ALTER publishes nothing.
    pub async fn apply(
        &self,
        completion: &MigrationRunCompletion,
        request: CredentialRequest,
    ) -> AppResult<ProvisionedCredential> {
        if request.username.as_str() == self.root.username {
            return Err(AppError::validation(format!(
                "{} is the root admin and is not provisioned",
                request.username
            )));
        }

        let password = match request.password {
            Some(password) => password,
            None => self.existing_or_generated(&request.secret_id).await?,
        };

        self.roles.set_password(&request.username, &password).await?;

        let ssl_mode = if request.no_ssl {
            None
        } else {
            Some(SslMode::VerifyFull)
        };
        let secret = CredentialSecret::for_role(&self.root, &request.username, password, ssl_mode);
        self.secrets
            .put(&request.secret_id, &secret.to_secret_value(&self.root)?)
            .await?;

        tracing::info!(
            role = %request.username,
            secret_id = %request.secret_id,
            fingerprint = %completion.fingerprint(),
            "Credentials provisioned"
        );

        Ok(ProvisionedCredential {
            physical_resource_id: format!("{}@{}", request.username, self.root.host),
            secret_id: request.secret_id,
            secret,
        })
    }

    /// Credentials are never revoked.
    pub async fn remove(&self, physical_resource_id: Option<&str>) -> AppResult<()> {
        tracing::warn!(
            resource = physical_resource_id.unwrap_or("<none>"),
            "Delete requested for credentials, leaving role untouched"
        );
        Ok(())
    }

    /// Change a role's password without publishing a secret.
    pub async fn change_password(&self, change: PasswordChange) -> AppResult<()> {
        self.roles
            .set_password(&change.username, &change.password)
            .await
    }

    /// Keep the password already published for this secret, if any.
    ///
    /// Only a missing secret or a secret without a `password` key yields a
    /// new password; an unreadable one is an error.
    async fn existing_or_generated(&self, secret_id: &str) -> AppResult<Password> {
        let existing = self.secrets.find(secret_id).await?;
        let Some(raw) = existing.as_ref().and_then(|value| value.get("password")) else {
            return Ok(Password::generate());
        };

        let plain = raw
            .as_str()
            .ok_or_else(|| AppError::secret(secret_id, "password is not a string"))?;
        let password = Password::new(plain).map_err(|e| AppError::secret(secret_id, e.to_string()))?;

        tracing::debug!(secret_id, "Reusing published password");
        Ok(password)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;
    use serde_json::json;

    use super::*;
    use crate::domain::{Fingerprint, Identifier};
    use crate::infra::{MemorySecretStore, MockRoleStore, MockSecretStore};

    fn root() -> DatabaseSecret {
        DatabaseSecret::from_value(
            "root",
            json!({
                "engine": "postgres",
                "host": "db.internal",
                "port": 5432,
                "username": "postgres",
                "password": "root-pass"
            }),
        )
        .unwrap()
    }

    fn completion() -> MigrationRunCompletion {
        MigrationRunCompletion::unchanged(Fingerprint::new("f"))
    }

    fn request(role: &str) -> CredentialRequest {
        CredentialRequest::new(Identifier::parse(role).unwrap(), format!("db/{}", role))
    }

    #[tokio::test]
    async fn test_apply_generates_and_publishes() {
        let mut roles = MockRoleStore::new();
        roles
            .expect_set_password()
            .withf(|role, password| role.as_str() == "authenticator" && password.expose().len() == 32)
            .times(1)
            .returning(|_, _| Ok(()));
        let secrets = Arc::new(MemorySecretStore::new());

        let provisioner = CredentialProvisioner::new(Arc::new(roles), secrets.clone(), root());
        let result = provisioner
            .apply(&completion(), request("authenticator"))
            .await
            .unwrap();

        assert_eq!(result.physical_resource_id, "authenticator@db.internal");
        let published = secrets.find("db/authenticator").await.unwrap().unwrap();
        assert_eq!(published["username"], "authenticator");
        assert_eq!(published["engine"], "postgres");
        assert_eq!(published["sslmode"], "verify-full");
        assert_eq!(published["password"], result.secret.password.expose());
    }

    #[tokio::test]
    async fn test_apply_reuses_published_password() {
        let mut roles = MockRoleStore::new();
        roles
            .expect_set_password()
            .withf(|_, password| password.expose() == "kept")
            .times(1)
            .returning(|_, _| Ok(()));
        let secrets = Arc::new(MemorySecretStore::new());
        secrets
            .insert("db/supabase_admin", json!({ "password": "kept" }))
            .await;

        let provisioner = CredentialProvisioner::new(Arc::new(roles), secrets, root());
        let result = provisioner
            .apply(&completion(), request("supabase_admin").without_ssl())
            .await
            .unwrap();

        assert_eq!(result.secret.sslmode, None);
        assert!(!result.secret.uri.contains("sslmode"));
    }

    #[tokio::test]
    async fn test_apply_failed_alter_publishes_nothing() {
        let mut roles = MockRoleStore::new();
        roles
            .expect_set_password()
            .with(always(), always())
            .returning(|_, _| Err(AppError::Database(sea_orm::DbErr::Custom("no role".into()))));
        let secrets = Arc::new(MemorySecretStore::new());

        let provisioner = CredentialProvisioner::new(Arc::new(roles), secrets.clone(), root());
        let result = provisioner
            .apply(
                &completion(),
                request("authenticator").with_password(Password::new("p1").unwrap()),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(secrets.find("db/authenticator").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_apply_rejects_root_admin() {
        let mut roles = MockRoleStore::new();
        roles.expect_set_password().never();

        let provisioner =
            CredentialProvisioner::new(Arc::new(roles), Arc::new(MemorySecretStore::new()), root());
        let result = provisioner.apply(&completion(), request("postgres")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_secret_failure_happens_before_alter() {
        let mut roles = MockRoleStore::new();
        roles.expect_set_password().never();
        let mut secrets = MockSecretStore::new();
        secrets
            .expect_find()
            .returning(|id| Err(AppError::secret(id, "permission denied")));
        secrets.expect_put().never();

        let provisioner = CredentialProvisioner::new(Arc::new(roles), Arc::new(secrets), root());
        let result = provisioner.apply(&completion(), request("authenticator")).await;

        assert!(matches!(result, Err(AppError::Secret { .. })));
    }

    #[tokio::test]
    async fn test_malformed_published_password_is_not_rotated() {
        for malformed in [json!({ "password": "" }), json!({ "password": 123 })] {
            let mut roles = MockRoleStore::new();
            roles.expect_set_password().never();
            let secrets = Arc::new(MemorySecretStore::new());
            secrets.insert("db/authenticator", malformed.clone()).await;

            let provisioner = CredentialProvisioner::new(Arc::new(roles), secrets.clone(), root());
            let result = provisioner.apply(&completion(), request("authenticator")).await;

            match result {
                Err(AppError::Secret { id, .. }) => assert_eq!(id, "db/authenticator"),
                other => panic!("unexpected result for {}: {:?}", malformed, other),
            }
            assert_eq!(secrets.find("db/authenticator").await.unwrap(), Some(malformed));
        }
    }

    #[tokio::test]
    async fn test_secret_without_password_key_gets_a_new_password() {
        let mut roles = MockRoleStore::new();
        roles
            .expect_set_password()
            .withf(|_, password| password.expose().len() == 32)
            .times(1)
            .returning(|_, _| Ok(()));
        let secrets = Arc::new(MemorySecretStore::new());
        secrets
            .insert("db/authenticator", json!({ "username": "authenticator" }))
            .await;

        let provisioner = CredentialProvisioner::new(Arc::new(roles), secrets, root());
        assert!(provisioner
            .apply(&completion(), request("authenticator"))
            .await
            .is_ok());
    }
}
