//! HTTP request handlers.

pub mod credential_handler;
pub mod migration_handler;
pub mod token_handler;

pub use credential_handler::credential_routes;
pub use migration_handler::migration_routes;
pub use token_handler::token_routes;
