//! Sub-account registry onboarding routes.
//!
//! Registry entries must exist before consolidation can update their
//! balances; these endpoints are that onboarding step.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::routes::documents::{actor_of, app_error_response};
use crate::{AppState, middleware::AuthUser};
use balanco_core::lifecycle::Role;
use balanco_db::repositories::{SubAccountRepository, UserRepository};
use balanco_shared::AppError;

/// Creates the sub-account registry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subaccounts", post(create_subaccount))
        .route("/subaccounts", get(list_subaccounts))
}

/// Request body for onboarding a registry entry.
#[derive(Debug, Deserialize)]
pub struct CreateSubAccountRequest {
    /// Owning counter-party user.
    pub counter_party_id: Uuid,
    /// Sub-account code.
    pub code: String,
    /// Display name.
    pub display_name: String,
}

/// Query parameters for listing registry entries.
#[derive(Debug, Deserialize)]
pub struct ListSubAccountsQuery {
    /// Counter-party to list entries for.
    pub counter_party_id: Uuid,
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}

/// Resolves the counter-party and checks the actor may manage its registry.
async fn check_counter_party_scope(
    state: &AppState,
    actor: &balanco_core::lifecycle::Actor,
    counter_party_id: Uuid,
) -> Result<balanco_db::entities::users::Model, Response> {
    if !actor.role.can_dispatch() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "ROLE_FORBIDDEN",
                "message": "This role cannot manage the sub-account registry"
            })),
        )
            .into_response());
    }

    let user_repo = UserRepository::new((*state.db).clone());
    let counter_party = match user_repo.find_by_id(counter_party_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "COUNTER_PARTY_NOT_FOUND",
                    "message": format!("Counter-party not found: {counter_party_id}")
                })),
            )
                .into_response());
        }
        Err(e) => {
            error!(error = %e, "Failed to load counter-party");
            return Err(internal_error());
        }
    };

    if actor.role != Role::SystemAdmin && counter_party.company_id != actor.company_id {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "COMPANY_MISMATCH",
                "message": "Counter-party belongs to a different company"
            })),
        )
            .into_response());
    }

    Ok(counter_party)
}

/// POST /subaccounts - Onboard a registry entry.
async fn create_subaccount(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateSubAccountRequest>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    if payload.code.trim().is_empty() {
        return app_error_response(&AppError::Validation(
            "sub-account code must not be empty".to_string(),
        ));
    }

    let counter_party =
        match check_counter_party_scope(&state, &actor, payload.counter_party_id).await {
            Ok(u) => u,
            Err(resp) => return resp,
        };

    let repo = SubAccountRepository::new((*state.db).clone());
    match repo
        .create(
            counter_party.company_id,
            counter_party.id,
            payload.code.trim(),
            payload.display_name.trim(),
        )
        .await
    {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to onboard sub-account");
            app_error_response(&AppError::Conflict(
                "sub-account could not be created (duplicate code?)".to_string(),
            ))
        }
    }
}

/// GET /subaccounts?counter_party_id= - List registry entries.
async fn list_subaccounts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListSubAccountsQuery>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    // A counter-party may list its own registry; staff go through the
    // company scope check.
    if actor.role != Role::CounterParty || actor.user_id != query.counter_party_id {
        if let Err(resp) = check_counter_party_scope(&state, &actor, query.counter_party_id).await
        {
            return resp;
        }
    }

    let repo = SubAccountRepository::new((*state.db).clone());
    match repo.list_for_counter_party(query.counter_party_id).await {
        Ok(entries) => (StatusCode::OK, Json(json!({ "subaccounts": entries }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list sub-accounts");
            internal_error()
        }
    }
}
