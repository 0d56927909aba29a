//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Start the HTTP invocation server
//! - `migrate` - Run, inspect and fingerprint migrations
//! - `bootstrap` - Migrations followed by role provisioning
//! - `provision` / `change-password` - Role credentials
//! - `sign-jwt` - API keys

pub mod args;

pub use args::{Cli, Commands};
