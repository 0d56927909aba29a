//! Domain layer - Core types of the database bootstrap.
//!
//! Plain values and validation only; no I/O.

pub mod connection;
pub mod credential;
pub mod identifier;
pub mod lifecycle;
pub mod migration;
pub mod password;
pub mod token;

pub use connection::{ConnectionDescriptor, SslMode};
pub use credential::{
    CredentialRequest, CredentialSecret, DatabaseRole, DatabaseSecret, PasswordChange,
    ProvisionedCredential,
};
pub use identifier::Identifier;
pub use lifecycle::{LifecycleEvent, MigrationInvocation, MigrationProperties, Operation, RequestType};
pub use migration::{
    select_pending, Fingerprint, Ledger, MigrationFile, MigrationRunCompletion, MigrationSet,
    MigrationState, MigrationStatus, SetReport, SetStatus,
};
pub use password::Password;
pub use token::{ExpiresIn, SigningSecret, TokenRequest};
