//! Application-wide constants
//!
//! Centralized location for magic values to improve maintainability.

// =============================================================================
// Secrets
// =============================================================================

/// Default identifier of the root admin (bootstrap) database secret
pub const DEFAULT_DB_SECRET_ID: &str = "supabase/db-secret";

/// Default identifier of the JWT signing secret
pub const DEFAULT_JWT_SECRET_ID: &str = "supabase/jwt-secret";

/// Default root directory of the file-backed secret store
pub const DEFAULT_SECRETS_DIR: &str = ".secrets";

/// Minimum JWT signing secret length
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

// =============================================================================
// Migrations
// =============================================================================

/// Default root of the migration source tree
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default schema holding the migration ledgers
pub const DEFAULT_MIGRATIONS_SCHEMA: &str = "drizzle";

/// File extension of migration files
pub const MIGRATION_FILE_EXTENSION: &str = "sql";

/// Init scripts: roles, schemas and extensions required by everything else
pub const INIT_SCRIPTS_FOLDER: &str = "init-scripts";
pub const INIT_SCRIPTS_TABLE: &str = "init-scripts-migrations";

/// Regular schema migrations
pub const MIGRATIONS_FOLDER: &str = "migrations";
pub const MIGRATIONS_TABLE: &str = "migrations";

/// Statements that cannot run inside a transaction (e.g. concurrent index builds)
pub const POST_INIT_FOLDER: &str = "post-init";
pub const POST_INIT_TABLE: &str = "post-init-migrations";

// =============================================================================
// Database
// =============================================================================

/// Database used when the bootstrap secret does not name one
pub const DEFAULT_DATABASE_NAME: &str = "postgres";

/// Default connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;

/// Postgres identifier length limit (NAMEDATALEN - 1)
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

// =============================================================================
// Credentials
// =============================================================================

/// Length of generated role passwords
pub const GENERATED_PASSWORD_LENGTH: usize = 32;

// =============================================================================
// Server Configuration
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 3000;
