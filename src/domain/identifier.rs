//! SQL identifier value object.
//!
//! Role, schema and table names reach SQL text only through this type.
//! The allow-list is strict enough that quoting never needs escaping.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::MAX_IDENTIFIER_LENGTH;
use crate::errors::{AppError, AppResult};

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_\-]*$").expect("identifier pattern is valid"));

/// A validated Postgres identifier (lowercase letters, digits, `_` and `-`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Validate a raw identifier against the allow-list.
    pub fn parse(raw: impl Into<String>) -> AppResult<Self> {
        let raw = raw.into();

        if raw.is_empty() || raw.len() > MAX_IDENTIFIER_LENGTH {
            return Err(AppError::InvalidIdentifier(format!(
                "{:?} must be 1 to {} characters",
                raw, MAX_IDENTIFIER_LENGTH
            )));
        }
        if !IDENTIFIER_PATTERN.is_match(&raw) {
            return Err(AppError::InvalidIdentifier(format!(
                "{:?} may only contain lowercase letters, digits, '_' and '-'",
                raw
            )));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for SQL text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identifier {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Identifier> for String {
    fn from(identifier: Identifier) -> Self {
        identifier.0
    }
}
