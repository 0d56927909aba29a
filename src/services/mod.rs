//! Application services layer - Use cases of the database bootstrap.
//!
//! Services orchestrate domain logic and infrastructure and depend on the
//! infrastructure traits, so they run unchanged against fakes.

mod bootstrap;
pub mod container;
mod credential_service;
mod migration_service;
mod token_service;

// Service Container
pub use container::{load_root_secret, Services};

// Services
pub use bootstrap::{Bootstrap, BootstrapOutcome, BootstrapRequest, BootstrapService};
pub use credential_service::CredentialProvisioner;
pub use migration_service::MigrationRunner;
pub use token_service::{sign, verify, TokenIssuer, TokenService};

#[cfg(any(test, feature = "test-utils"))]
pub use bootstrap::MockBootstrapService;
#[cfg(any(test, feature = "test-utils"))]
pub use token_service::MockTokenService;
