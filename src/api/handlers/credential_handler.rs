//! Credential handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::extractors::{JsonBody, ValidatedJson};
use crate::api::AppState;
use crate::domain::{CredentialRequest, Identifier, LifecycleEvent, Operation, Password, PasswordChange};
use crate::errors::AppResult;

/// Direct password change request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 63, message = "Username must be 1 to 63 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl ChangePasswordRequest {
    fn into_change(self) -> AppResult<PasswordChange> {
        Ok(PasswordChange {
            username: Identifier::parse(self.username)?,
            password: Password::new(self.password)?,
        })
    }
}

/// Create credential routes
pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(provision))
        .route("/password", post(change_password))
}

/// Provision one role from a lifecycle event.
///
/// Refused with 409 until every migration is applied.
pub async fn provision(
    State(state): State<AppState>,
    JsonBody(event): JsonBody<LifecycleEvent<CredentialRequest>>,
) -> AppResult<Response> {
    match event.into_operation() {
        Operation::Apply(request) => {
            let provisioned = state.bootstrap.provision(request).await?;
            Ok(Json(provisioned).into_response())
        }
        Operation::Remove(physical_resource_id) => {
            state.bootstrap.remove(physical_resource_id).await?;
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

/// Set a role's password
pub async fn change_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    state.bootstrap.change_password(payload.into_change()?).await?;
    Ok(StatusCode::NO_CONTENT)
}
