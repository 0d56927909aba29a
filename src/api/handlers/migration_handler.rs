//! Migration handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};

use crate::api::extractors::JsonBody;
use crate::api::AppState;
use crate::domain::{Fingerprint, MigrationInvocation, Operation, SetStatus};
use crate::errors::AppResult;

/// Create migration routes
pub fn migration_routes() -> Router<AppState> {
    Router::new().route("/", get(status).post(invoke))
}

/// Run migrations for a lifecycle event or a direct `{ "hash": ... }` call.
///
/// Delete is acknowledged with 204; migrations are never rolled back.
pub async fn invoke(
    State(state): State<AppState>,
    JsonBody(invocation): JsonBody<MigrationInvocation>,
) -> AppResult<Response> {
    let properties = match invocation.into_operation() {
        Operation::Apply(properties) => properties,
        Operation::Remove(_) => {
            tracing::warn!("Delete requested for migrations, nothing to do");
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
    };

    let completion = state
        .bootstrap
        .migrate(properties.previous_fingerprint.map(Fingerprint::new))
        .await?;

    if let Some(requested) = properties.fingerprint.as_deref() {
        if requested != completion.fingerprint().as_str() {
            tracing::warn!(
                requested,
                on_disk = %completion.fingerprint(),
                "Invocation fingerprint differs from the migration tree on disk"
            );
        }
    }

    Ok(Json(completion).into_response())
}

/// Applied/pending state of every migration set
pub async fn status(State(state): State<AppState>) -> AppResult<Json<Vec<SetStatus>>> {
    Ok(Json(state.bootstrap.status().await?))
}
