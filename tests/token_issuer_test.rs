//! API key issuance tests.

mod common;

use std::sync::Arc;

use serde_json::json;

use supabase_bootstrap::domain::{ExpiresIn, SigningSecret, TokenRequest};
use supabase_bootstrap::errors::AppError;
use supabase_bootstrap::infra::MemorySecretStore;
use supabase_bootstrap::services::{verify, TokenIssuer, TokenService};

use common::{secrets, JWT_SECRET, JWT_SECRET_ID};

#[tokio::test]
async fn test_claims_carry_payload_issuer_and_expiry() {
    let issuer = TokenIssuer::new(secrets().await, JWT_SECRET_ID);
    let mut request = TokenRequest::for_role("service_role", "supabase", "10y".parse().unwrap());
    request.payload.insert("ref".into(), json!("project"));

    let token = issuer.issue(&request).await.unwrap();
    let claims = verify(&SigningSecret::new(JWT_SECRET).unwrap(), &token, "supabase").unwrap();

    assert_eq!(claims["role"], "service_role");
    assert_eq!(claims["ref"], "project");
    assert_eq!(claims["iss"], "supabase");

    let iat = claims["iat"].as_i64().unwrap();
    let exp = claims["exp"].as_i64().unwrap();
    assert_eq!(exp - iat, request.expires_in.whole_seconds());
}

#[tokio::test]
async fn test_numeric_expiry_is_seconds() {
    let issuer = TokenIssuer::new(secrets().await, JWT_SECRET_ID);
    let expires_in: ExpiresIn = serde_json::from_value(json!(3600)).unwrap();
    let request = TokenRequest::for_role("anon", "supabase", expires_in);

    let token = issuer.issue(&request).await.unwrap();
    let claims = verify(&SigningSecret::new(JWT_SECRET).unwrap(), &token, "supabase").unwrap();

    assert_eq!(claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(), 3600);
}

#[tokio::test]
async fn test_missing_signing_secret_is_fatal() {
    let issuer = TokenIssuer::new(Arc::new(MemorySecretStore::new()), JWT_SECRET_ID);
    let request = TokenRequest::for_role("anon", "supabase", ExpiresIn::from_seconds(60).unwrap());

    match issuer.issue(&request).await {
        Err(AppError::Secret { id, .. }) => assert_eq!(id, JWT_SECRET_ID),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_secret_fails_verification() {
    let issuer = TokenIssuer::new(secrets().await, JWT_SECRET_ID);
    let request = TokenRequest::for_role("anon", "supabase", ExpiresIn::from_seconds(60).unwrap());
    let token = issuer.issue(&request).await.unwrap();

    let other = SigningSecret::new("another-secret-that-is-long-enough-to-use").unwrap();
    assert!(matches!(verify(&other, &token, "supabase"), Err(AppError::Jwt(_))));
}
