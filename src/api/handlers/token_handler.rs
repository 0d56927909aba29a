//! API key handlers.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{ExpiresIn, TokenRequest};
use crate::errors::AppResult;

/// Token issuance request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest {
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[validate(length(min = 1, message = "Issuer is required"))]
    pub issuer: String,
    pub expires_in: ExpiresIn,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Create token routes
pub fn token_routes() -> Router<AppState> {
    Router::new().route("/", post(issue))
}

/// Sign an API key
pub async fn issue(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<IssueTokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let request = TokenRequest {
        payload: payload.payload,
        issuer: payload.issuer,
        expires_in: payload.expires_in,
    };
    let token = state.tokens.issue(&request).await?;

    Ok(Json(TokenResponse { token }))
}
