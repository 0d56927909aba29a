//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - PostgreSQL connection, migration ledgers and role passwords
//! - The secret store
//! - The migration source tree on disk

pub mod db;
pub mod secrets;
pub mod source;

pub use db::{Database, MigrationBackend, RoleStore};
pub use secrets::{require_secret, FileSecretStore, MemorySecretStore, SecretStore};
pub use source::{fingerprint, fingerprint_tree, load_migrations};

#[cfg(any(test, feature = "test-utils"))]
pub use db::{MockMigrationBackend, MockRoleStore};
#[cfg(any(test, feature = "test-utils"))]
pub use secrets::MockSecretStore;
