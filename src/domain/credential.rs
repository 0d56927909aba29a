//! Database roles, the bootstrap secret and published credential secrets.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{ConnectionDescriptor, Identifier, Password, SslMode};
use crate::config::DEFAULT_DATABASE_NAME;
use crate::errors::{AppError, AppResult};

/// A Postgres role that needs a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRole {
    pub username: Identifier,
    /// Root admin credentials come from the bootstrap secret and are never
    /// provisioned here.
    pub is_root_admin: bool,
}

/// Root admin secret the whole bootstrap starts from.
///
/// Accepts the shape written by the deployment tooling: `port` may be a
/// string or a number, `dbname` and `ssl` are optional. Unknown fields are
/// kept and carried into every published credential secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSecret {
    pub host: String,
    #[serde(deserialize_with = "port_from_string_or_number")]
    pub port: u16,
    pub username: String,
    pub password: Password,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,
    #[serde(default = "default_ssl")]
    pub ssl: bool,
    #[serde(
        default,
        rename = "psBranchId",
        alias = "branchId",
        skip_serializing_if = "Option::is_none"
    )]
    pub branch_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_ssl() -> bool {
    true
}

fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl DatabaseSecret {
    /// Decode a secret value read from the secret store.
    pub fn from_value(id: &str, value: Value) -> AppResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::secret(id, format!("malformed database secret: {}", e)))
    }

    pub fn dbname(&self) -> &str {
        self.dbname
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DATABASE_NAME)
    }

    /// Connection descriptor for the root admin.
    ///
    /// `ssl` means encrypted without certificate verification.
    pub fn admin_descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            dbname: self.dbname().to_string(),
            ssl_mode: Some(if self.ssl {
                SslMode::Require
            } else {
                SslMode::Disable
            }),
        }
    }

    pub fn root_role(&self) -> AppResult<DatabaseRole> {
        Ok(DatabaseRole {
            username: Identifier::parse(self.username.clone())?,
            is_root_admin: true,
        })
    }

    /// Username a role connects with: `<role>[.<branch-id>]`.
    pub fn connection_username(&self, role: &Identifier) -> String {
        match self.branch_id.as_deref().filter(|id| !id.is_empty()) {
            Some(branch) => format!("{}.{}", role, branch),
            None => role.to_string(),
        }
    }
}

/// Request to provision one role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialRequest {
    pub username: Identifier,
    pub secret_id: String,
    /// Desired password; read from the target secret or generated when absent
    #[serde(default)]
    pub password: Option<Password>,
    /// Publish a URI without `sslmode=verify-full`
    #[serde(default)]
    pub no_ssl: bool,
}

impl CredentialRequest {
    pub fn new(username: Identifier, secret_id: impl Into<String>) -> Self {
        Self {
            username,
            secret_id: secret_id.into(),
            password: None,
            no_ssl: false,
        }
    }

    pub fn with_password(mut self, password: Password) -> Self {
        self.password = Some(password);
        self
    }

    pub fn without_ssl(mut self) -> Self {
        self.no_ssl = true;
        self
    }
}

/// Direct password change request.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub username: Identifier,
    pub password: Password,
}

/// Connection descriptor published for a provisioned role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialSecret {
    pub username: String,
    pub password: Password,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sslmode: Option<SslMode>,
}

impl CredentialSecret {
    /// Build the descriptor for `role` connecting through `root`'s endpoint.
    pub fn for_role(
        root: &DatabaseSecret,
        role: &Identifier,
        password: Password,
        ssl_mode: Option<SslMode>,
    ) -> Self {
        let descriptor = ConnectionDescriptor {
            host: root.host.clone(),
            port: root.port,
            username: root.connection_username(role),
            password,
            dbname: root.dbname().to_string(),
            ssl_mode,
        };

        Self {
            uri: descriptor.uri(),
            username: descriptor.username,
            password: descriptor.password,
            host: descriptor.host,
            port: descriptor.port,
            dbname: descriptor.dbname,
            sslmode: descriptor.ssl_mode,
        }
    }

    /// Secret document: the root secret's fields overlaid with this role's.
    pub fn to_secret_value(&self, root: &DatabaseSecret) -> AppResult<Value> {
        let mut document = match serde_json::to_value(root) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(AppError::internal(format!("Secret encoding failed: {}", e))),
        };

        let overlay = serde_json::to_value(self)
            .map_err(|e| AppError::internal(format!("Secret encoding failed: {}", e)))?;
        if let Value::Object(fields) = overlay {
            document.extend(fields);
        }

        Ok(Value::Object(document))
    }
}

/// Outcome of a provisioning run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedCredential {
    /// `<role>@<host>`
    pub physical_resource_id: String,
    pub secret_id: String,
    #[serde(skip)]
    pub secret: CredentialSecret,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn root() -> DatabaseSecret {
        DatabaseSecret::from_value(
            "root",
            json!({
                "engine": "postgres",
                "host": "aws.connect.psdb.cloud",
                "port": "5432",
                "username": "postgres",
                "password": "root-pass",
                "dbname": "postgres",
                "psBranchId": "br-7"
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_port_as_string_or_number() {
        assert_eq!(root().port, 5432);

        let numeric = DatabaseSecret::from_value(
            "root",
            json!({ "host": "h", "port": 6543, "username": "u", "password": "p" }),
        )
        .unwrap();
        assert_eq!(numeric.port, 6543);
        assert_eq!(numeric.dbname(), "postgres");
        assert!(numeric.ssl);
    }

    #[test]
    fn test_malformed_secret_is_secret_error() {
        let err = DatabaseSecret::from_value("root", json!({ "host": "h" })).unwrap_err();
        assert!(matches!(err, AppError::Secret { .. }));
    }

    #[test]
    fn test_connection_username_carries_branch() {
        let role = Identifier::parse("authenticator").unwrap();
        assert_eq!(root().connection_username(&role), "authenticator.br-7");
    }

    #[test]
    fn test_secret_document_overlays_root() {
        let role = Identifier::parse("supabase_auth_admin").unwrap();
        let secret = CredentialSecret::for_role(
            &root(),
            &role,
            Password::new("p2").unwrap(),
            Some(SslMode::VerifyFull),
        );
        let doc = secret.to_secret_value(&root()).unwrap();

        assert_eq!(doc["engine"], "postgres");
        assert_eq!(doc["username"], "supabase_auth_admin.br-7");
        assert_eq!(doc["password"], "p2");
        assert_eq!(doc["sslmode"], "verify-full");
        assert_eq!(
            doc["uri"],
            "postgres://supabase_auth_admin.br-7:p2@aws.connect.psdb.cloud:5432/postgres?sslmode=verify-full"
        );
    }

    #[test]
    fn test_credential_request_from_lifecycle_properties() {
        let request: CredentialRequest = serde_json::from_value(json!({
            "Username": "authenticator",
            "SecretId": "Supabase-db-authenticator"
        }))
        .unwrap();

        assert_eq!(request.username.as_str(), "authenticator");
        assert!(request.password.is_none());
        assert!(!request.no_ssl);
    }
}
