//! API key (JWT) request types.

use std::str::FromStr;

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::config::MIN_JWT_SECRET_LENGTH;
use crate::errors::{AppError, AppResult};

static TIMESPAN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\d+(?:\.\d+)?) *(milliseconds?|msecs?|ms|seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|w|years?|yrs?|y)?$",
    )
    .expect("timespan pattern is valid")
});

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = MS_PER_SECOND * 60.0;
const MS_PER_HOUR: f64 = MS_PER_MINUTE * 60.0;
const MS_PER_DAY: f64 = MS_PER_HOUR * 24.0;
const MS_PER_WEEK: f64 = MS_PER_DAY * 7.0;
const MS_PER_YEAR: f64 = MS_PER_DAY * 365.25;

/// Shared HS256 signing secret.
#[derive(Clone)]
pub struct SigningSecret(String);

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

impl SigningSecret {
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::validation(format!(
                "Signing secret must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        Ok(Self(value))
    }

    /// Decode a value from the secret store: a bare string or `{ "value": ... }`.
    pub fn from_value(id: &str, value: &Value) -> AppResult<Self> {
        let raw = match value {
            Value::String(s) => s.as_str(),
            Value::Object(map) => map
                .get("value")
                .and_then(Value::as_str)
                .ok_or_else(|| AppError::secret(id, "missing \"value\" field"))?,
            _ => return Err(AppError::secret(id, "expected a string or an object")),
        };
        Self::new(raw).map_err(|e| AppError::secret(id, e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Token lifetime.
///
/// JSON numbers are seconds. Strings are `<n>[ ]<unit>` with units from `ms`
/// to `y`; a string without a unit is milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiresIn(Duration);

impl ExpiresIn {
    pub fn from_seconds(seconds: i64) -> AppResult<Self> {
        if seconds <= 0 {
            return Err(AppError::validation("expiresIn must be positive"));
        }
        Duration::try_seconds(seconds)
            .map(Self)
            .ok_or_else(|| AppError::validation(format!("expiresIn {} is out of range", seconds)))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Whole seconds added to the issue time.
    pub fn whole_seconds(&self) -> i64 {
        self.0.num_seconds()
    }
}

impl FromStr for ExpiresIn {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = TIMESPAN_PATTERN
            .captures(s.trim())
            .ok_or_else(|| AppError::validation(format!("Invalid expiresIn {:?}", s)))?;

        let amount: f64 = captures[1]
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid expiresIn {:?}", s)))?;
        let unit = captures
            .get(2)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();

        let factor = match unit.as_str() {
            "years" | "year" | "yrs" | "yr" | "y" => MS_PER_YEAR,
            "weeks" | "week" | "w" => MS_PER_WEEK,
            "days" | "day" | "d" => MS_PER_DAY,
            "hours" | "hour" | "hrs" | "hr" | "h" => MS_PER_HOUR,
            "minutes" | "minute" | "mins" | "min" | "m" => MS_PER_MINUTE,
            "seconds" | "second" | "secs" | "sec" | "s" => MS_PER_SECOND,
            _ => 1.0,
        };

        let millis = (amount * factor).round();
        if !millis.is_finite() || millis >= i64::MAX as f64 {
            return Err(AppError::validation(format!("expiresIn {:?} is out of range", s)));
        }
        let millis = millis as i64;
        if millis < 1_000 {
            return Err(AppError::validation(format!(
                "expiresIn {:?} is shorter than one second",
                s
            )));
        }

        Duration::try_milliseconds(millis)
            .map(Self)
            .ok_or_else(|| AppError::validation(format!("expiresIn {:?} is out of range", s)))
    }
}

impl<'de> Deserialize<'de> for ExpiresIn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Seconds(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Seconds(seconds) => {
                ExpiresIn::from_seconds(seconds).map_err(serde::de::Error::custom)
            }
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Token issuance request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub payload: Map<String, Value>,
    pub issuer: String,
    pub expires_in: ExpiresIn,
}

impl TokenRequest {
    /// API key request for a Postgres role: payload `{ "role": <role> }`.
    pub fn for_role(role: &str, issuer: impl Into<String>, expires_in: ExpiresIn) -> Self {
        let mut payload = Map::new();
        payload.insert("role".to_string(), Value::String(role.to_string()));
        Self {
            payload,
            issuer: issuer.into(),
            expires_in,
        }
    }
}
