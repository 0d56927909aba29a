//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Supabase bootstrap - Database migrations, role credentials and API keys
#[derive(Parser, Debug)]
#[command(name = "supabase-bootstrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Root directory of the file-backed secret store
    #[arg(long, global = true)]
    pub secrets_dir: Option<PathBuf>,

    /// Root of the migration tree
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP invocation server
    Serve(ServeArgs),

    /// Run or inspect database migrations
    Migrate(MigrateArgs),

    /// Run migrations, then provision every listed role
    Bootstrap(BootstrapArgs),

    /// Provision one role once migrations are applied
    Provision(ProvisionArgs),

    /// Change a role's password
    ChangePassword(ChangePasswordArgs),

    /// Print a signed API key for a role
    SignJwt(SignJwtArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up {
        /// Fingerprint of the last successful run; skips the run when unchanged
        #[arg(long, env = "PREVIOUS_FINGERPRINT")]
        previous_fingerprint: Option<String>,
    },
    /// Show migration status
    Status,
    /// Print the fingerprint of the migration tree
    Fingerprint,
}

/// A role to provision: `<username>=<secret-id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    pub username: String,
    pub secret_id: String,
}

fn parse_role_spec(raw: &str) -> Result<RoleSpec, String> {
    match raw.split_once('=') {
        Some((username, secret_id)) if !username.is_empty() && !secret_id.is_empty() => {
            Ok(RoleSpec {
                username: username.to_string(),
                secret_id: secret_id.to_string(),
            })
        }
        _ => Err(format!("expected <username>=<secret-id>, got {:?}", raw)),
    }
}

/// Arguments for the bootstrap command
#[derive(Parser, Debug)]
pub struct BootstrapArgs {
    /// Fingerprint of the last successful run; skips migrations when unchanged
    #[arg(long, env = "PREVIOUS_FINGERPRINT")]
    pub previous_fingerprint: Option<String>,

    /// Role to provision after migrations, as `<username>=<secret-id>`
    #[arg(long = "role", value_parser = parse_role_spec)]
    pub roles: Vec<RoleSpec>,

    /// Publish connection URIs without `sslmode=verify-full`
    #[arg(long)]
    pub no_ssl: bool,
}

/// Arguments for the provision command
#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    /// Role name
    #[arg(long)]
    pub username: String,

    /// Secret to publish the connection descriptor to
    #[arg(long)]
    pub secret_id: String,

    /// Password to set; defaults to the published one or a generated one
    #[arg(long, env = "DB_USER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Publish a connection URI without `sslmode=verify-full`
    #[arg(long)]
    pub no_ssl: bool,
}

/// Arguments for the change-password command
#[derive(Parser, Debug)]
pub struct ChangePasswordArgs {
    /// Role name
    #[arg(long)]
    pub username: String,

    /// New password
    #[arg(long, env = "DB_USER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the sign-jwt command
#[derive(Parser, Debug)]
pub struct SignJwtArgs {
    /// Value of the `role` claim
    #[arg(long)]
    pub role: String,

    /// Token issuer (`iss`)
    #[arg(long, default_value = "supabase")]
    pub issuer: String,

    /// Lifetime, e.g. `10y`, `12h` or `3600s`
    #[arg(long, default_value = "10y")]
    pub expires_in: String,
}
