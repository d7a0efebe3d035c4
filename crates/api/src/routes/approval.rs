//! Public approval routes: the unauthenticated token channel.
//!
//! These endpoints carry no caller authentication; the single-use bearer
//! token delivered out-of-band is the entire credential. Verification is a
//! read-only preview, approve/reject consume the token inside the same
//! transaction as the transition. The router wraps these in the keyed rate
//! limiter.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use crate::routes::documents::lifecycle_error_response;
use balanco_db::entities::documents;
use balanco_db::repositories::{ApprovalTokenRepository, LifecycleRepository, UserRepository};
use balanco_shared::types::OriginInfo;

/// Creates the public approval routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approval/{token}", get(preview))
        .route("/approval/{token}/approve", post(approve))
        .route("/approval/{token}/reject", post(reject))
}

/// Request body for a rejection.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Non-empty reason for the dispute.
    pub reason: String,
    /// Whether the counter-party wants a detailed statement.
    #[serde(default)]
    pub request_statement: bool,
}

/// The document view exposed to an anonymous token holder.
fn preview_body(document: &documents::Model) -> serde_json::Value {
    json!({
        "document_number": document.document_number,
        "counter_party_taxpayer_id": document.counter_party_taxpayer_id,
        "period_start": document.period_start.to_string(),
        "period_end": document.period_end.to_string(),
        "total_debit": document.total_debit.to_string(),
        "total_credit": document.total_credit.to_string(),
        "net_balance": document.net_balance.to_string(),
        "line_count": document.line_count,
        "note": document.note,
        "status": document.status.as_core().to_string(),
    })
}

/// Where the anonymous request came from, for audit logging only. The
/// domain core never sees this.
fn request_origin(headers: &HeaderMap) -> OriginInfo {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| OriginInfo::from_ip(ip.trim()))
        .unwrap_or_default()
}

/// GET /approval/{token} - Read-only preview; does NOT consume the token.
async fn preview(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    let repo = ApprovalTokenRepository::new((*state.db).clone());

    match repo.verify(&token).await {
        Ok(document) => (StatusCode::OK, Json(preview_body(&document))).into_response(),
        Err(e) => lifecycle_error_response(&e),
    }
}

/// POST /approval/{token}/approve - Consume the token and approve.
async fn approve(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Response {
    let origin = request_origin(&headers);
    let repo = LifecycleRepository::new((*state.db).clone());

    match repo.approve_with_token(&token).await {
        Ok(document) => {
            info!(
                document_number = %document.document_number,
                origin_ip = origin.ip.as_deref().unwrap_or("unknown"),
                "Document approved via token"
            );
            dispatch_issuer_notice(&state, &document, None);
            (StatusCode::OK, Json(preview_body(&document))).into_response()
        }
        Err(e) => lifecycle_error_response(&e),
    }
}

/// POST /approval/{token}/reject - Consume the token and reject.
async fn reject(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<RejectRequest>,
) -> Response {
    let origin = request_origin(&headers);
    let repo = LifecycleRepository::new((*state.db).clone());

    match repo
        .reject_with_token(&token, payload.reason.clone(), payload.request_statement)
        .await
    {
        Ok(document) => {
            info!(
                document_number = %document.document_number,
                origin_ip = origin.ip.as_deref().unwrap_or("unknown"),
                "Document rejected via token"
            );
            dispatch_issuer_notice(&state, &document, Some(payload.reason));
            (StatusCode::OK, Json(preview_body(&document))).into_response()
        }
        Err(e) => lifecycle_error_response(&e),
    }
}

/// Fire-and-forget email notice to the issuer after the transition commits.
pub(crate) fn dispatch_issuer_notice(
    state: &AppState,
    document: &documents::Model,
    rejection_reason: Option<String>,
) {
    let user_repo = UserRepository::new((*state.db).clone());
    let email = state.email_service.clone();
    let issuer_id = document.issuer_id;
    let document_number = document.document_number.clone();

    tokio::spawn(async move {
        let issuer_email = match user_repo.find_by_id(issuer_id).await {
            Ok(Some(user)) => user.email,
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "Failed to load issuer for notification");
                return;
            }
        };

        let Some(to) = issuer_email else {
            return;
        };

        let result = match rejection_reason {
            None => email.send_approval_notice(&to, &document_number).await,
            Some(reason) => {
                email
                    .send_rejection_notice(&to, &document_number, &reason)
                    .await
            }
        };

        if let Err(e) = result {
            // Log and continue: the transition is already durable.
            error!(error = %e, "Issuer notification email failed");
        }
    });
}
