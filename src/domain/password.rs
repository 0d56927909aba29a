//! Password value object - Database role password handling.
//!
//! Holds the plain text because it has to reach both the database and the
//! published secret. It serializes as a plain string but never prints.

use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::config::GENERATED_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// Role password value object.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Password {
    plain: String,
}

// Don't expose the password in debug output
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("plain", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Wrap an externally supplied password.
    ///
    /// # Errors
    /// Returns validation error if the password is empty or contains NUL,
    /// which Postgres cannot store.
    pub fn new(plain: impl Into<String>) -> AppResult<Self> {
        let plain = plain.into();

        if plain.is_empty() {
            return Err(AppError::validation("Password must not be empty"));
        }
        if plain.contains('\0') {
            return Err(AppError::validation("Password must not contain NUL bytes"));
        }

        Ok(Self { plain })
    }

    /// Generate a random alphanumeric password.
    pub fn generate() -> Self {
        let plain = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_PASSWORD_LENGTH)
            .map(char::from)
            .collect();
        Self { plain }
    }

    /// Plain text, for the database and the published secret only.
    pub fn expose(&self) -> &str {
        &self.plain
    }
}

impl TryFrom<String> for Password {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.plain
    }
}
