//! Centralized error handling.
//!
//! Every failure is fatal to the current invocation and propagates to the
//! caller unchanged; nothing in the crate retries.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Database
    #[error("Database unreachable: {0}")]
    Connectivity(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Migration {migration} failed in ledger {ledger}: {source}")]
    Migration {
        ledger: String,
        migration: String,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("Ledger inconsistency: {0}")]
    Ledger(String),

    #[error("Migrations pending: {0}")]
    MigrationsPending(String),

    // Secrets
    #[error("Secret {id} could not be resolved: {reason}")]
    Secret { id: String, reason: String },

    // Validation
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("{0}")]
    Validation(String),

    // Tokens
    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Connectivity(_) => "CONNECTIVITY_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Migration { .. } => "MIGRATION_FAILED",
            AppError::Ledger(_) => "LEDGER_INCONSISTENT",
            AppError::MigrationsPending(_) => "MIGRATIONS_PENDING",
            AppError::Secret { .. } => "SECRET_UNRESOLVED",
            AppError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Jwt(_) => "TOKEN_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MigrationsPending(_) => StatusCode::CONFLICT,
            AppError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_)
            | AppError::Migration { .. }
            | AppError::Ledger(_)
            | AppError::Secret { .. }
            | AppError::Jwt(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message
    fn user_message(&self) -> String {
        match self {
            // The caller owns the migration files; the failing file is actionable
            AppError::Migration { migration, .. } => {
                tracing::error!("{}", self);
                format!("Migration {} failed", migration)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Secret { id, reason } => {
                tracing::error!("Secret {} unresolved: {}", id, reason);
                format!("Secret {} could not be resolved", id)
            }
            AppError::Jwt(e) => {
                tracing::error!("JWT error: {:?}", e);
                "Token could not be issued".to_string()
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {:?}", e);
                "An I/O error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn secret(id: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Secret {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
