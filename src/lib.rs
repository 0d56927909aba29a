//! Supabase bootstrap - Database bootstrap for a self-hosted Supabase stack
//!
//! Applies ordered SQL migration sets exactly once, provisions per-role
//! database credentials only after migrations succeed, and signs API keys.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Identifiers, secrets, migration sets and tokens
//! - **services**: Migration runner, credential provisioner, sequencer, token issuer
//! - **infra**: PostgreSQL, the secret store and the migration tree on disk
//! - **api**: HTTP handlers and routes
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Run pending migrations
//! supabase-bootstrap migrate up
//!
//! # Migrate, then provision roles
//! supabase-bootstrap bootstrap --role authenticator=supabase/db/authenticator
//!
//! # Sign an anon key
//! supabase-bootstrap sign-jwt --role anon --expires-in 10y
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Identifier, MigrationRunCompletion, Password};
pub use errors::{AppError, AppResult};
