//! Bulk import route: consolidation batches.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::routes::documents::actor_of;
use crate::{AppState, middleware::AuthUser};
use balanco_core::reconcile::RawRow;
use balanco_db::repositories::{ConsolidationRepository, ConsolidationSettings};

/// Creates the import routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/documents/import", post(import_rows))
}

/// Request body for a consolidation batch.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Raw ledger rows, in upload order.
    pub rows: Vec<RawRow>,
}

/// POST /documents/import - Run one consolidation batch.
///
/// Always returns a structured result with partial-success detail: every
/// row either contributed to a created document or appears in `errors`.
async fn import_rows(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ImportRequest>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    if !actor.role.can_dispatch() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "ROLE_FORBIDDEN",
                "message": "This role cannot import reconciliation batches"
            })),
        )
            .into_response();
    }

    let settings = ConsolidationSettings::from(&state.reconciliation);
    let repo = ConsolidationRepository::new((*state.db).clone());

    match repo.consolidate(&actor, payload.rows, &settings).await {
        Ok(result) => {
            info!(
                created = result.created_count,
                failed = result.failed_count,
                "Consolidation batch finished"
            );
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(json!({
                    "error": e.error_code(),
                    "message": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
