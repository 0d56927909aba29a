//! Token issuer - Signs API keys (HS256 JWTs) with the shared secret.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

use crate::domain::{SigningSecret, TokenRequest};
use crate::errors::{AppError, AppResult};
use crate::infra::{require_secret, SecretStore};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Claims the issuer sets itself.
const RESERVED_CLAIMS: [&str; 3] = ["iss", "iat", "exp"];

/// Token service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Sign a token for the request with the current signing secret
    async fn issue(&self, request: &TokenRequest) -> AppResult<String>;
}

/// Sign `request` as of `issued_at`.
///
/// Claims are the payload plus `iss`, `iat` and `exp = iat + expires_in`,
/// in whole seconds.
pub fn sign(secret: &SigningSecret, request: &TokenRequest, issued_at: DateTime<Utc>) -> AppResult<String> {
    if request.issuer.trim().is_empty() {
        return Err(AppError::validation("issuer is required"));
    }
    if let Some(claim) = RESERVED_CLAIMS
        .iter()
        .find(|claim| request.payload.contains_key(**claim))
    {
        return Err(AppError::validation(format!(
            "payload must not set the {} claim",
            claim
        )));
    }

    let iat = issued_at.timestamp();
    let exp = iat
        .checked_add(request.expires_in.whole_seconds())
        .ok_or_else(|| AppError::validation("expiresIn is out of range"))?;

    let mut claims = request.payload.clone();
    claims.insert("iss".to_string(), Value::from(request.issuer.clone()));
    claims.insert("iat".to_string(), Value::from(iat));
    claims.insert("exp".to_string(), Value::from(exp));

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Decode and check a token signed by [`sign`].
pub fn verify(secret: &SigningSecret, token: &str, issuer: &str) -> AppResult<Map<String, Value>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);

    let data = decode::<Map<String, Value>>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Resolves the signing secret on every call so rotations apply at once.
pub struct TokenIssuer {
    secrets: Arc<dyn SecretStore>,
    secret_id: String,
}

impl TokenIssuer {
    pub fn new(secrets: Arc<dyn SecretStore>, secret_id: impl Into<String>) -> Self {
        Self {
            secrets,
            secret_id: secret_id.into(),
        }
    }

    async fn signing_secret(&self) -> AppResult<SigningSecret> {
        let value = require_secret(self.secrets.as_ref(), &self.secret_id).await?;
        SigningSecret::from_value(&self.secret_id, &value)
    }
}

#[async_trait]
impl TokenService for TokenIssuer {
    async fn issue(&self, request: &TokenRequest) -> AppResult<String> {
        let secret = self.signing_secret().await?;
        let token = sign(&secret, request, Utc::now())?;

        tracing::info!(
            issuer = %request.issuer,
            expires_in = request.expires_in.whole_seconds(),
            "Token issued"
        );
        Ok(token)
    }
}
