//! Reconciliation document routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use balanco_core::lifecycle::{Actor, DocumentStatus as CoreStatus, LifecycleError};
use balanco_db::entities::{document_lines, documents};
use balanco_db::repositories::{
    CreateDocumentInput, DocumentError, DocumentFilter, DocumentRepository, LifecycleRepository,
    UpdateDraftInput, UserRepository,
};
use balanco_shared::types::{PageRequest, PageResponse};

/// Creates the document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents))
        .route("/documents", post(create_document))
        .route("/documents/{document_id}", get(get_document))
        .route("/documents/{document_id}", patch(update_document))
        .route("/documents/{document_id}", delete(delete_document))
        .route("/documents/{document_id}/send", post(send_document))
        .route("/documents/{document_id}/approve", post(approve_document))
        .route("/documents/{document_id}/reject", post(reject_document))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing documents.
#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    /// Filter by status.
    pub status: Option<String>,
    /// Filter by period overlap start (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Filter by period overlap end (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
    /// Filter by counter-party taxpayer id.
    pub taxpayer_id: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for manual document creation.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    /// The named counter-party user.
    pub counter_party_id: Uuid,
    /// Period start (YYYY-MM-DD).
    pub period_start: NaiveDate,
    /// Period end (YYYY-MM-DD).
    pub period_end: NaiveDate,
    /// Aggregate debit.
    pub total_debit: Decimal,
    /// Aggregate credit.
    pub total_credit: Decimal,
    /// Free-text note.
    #[serde(default)]
    pub note: String,
}

/// Request body for draft edits.
#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    /// New period start.
    pub period_start: Option<NaiveDate>,
    /// New period end.
    pub period_end: Option<NaiveDate>,
    /// New aggregate debit.
    pub total_debit: Option<Decimal>,
    /// New aggregate credit.
    pub total_credit: Option<Decimal>,
    /// New note.
    pub note: Option<String>,
}

/// Response for a document.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// Document ID.
    pub id: Uuid,
    /// Document number.
    pub document_number: String,
    /// Owning company (the counter-party's).
    pub company_id: Uuid,
    /// Issuer user ID.
    pub issuer_id: Uuid,
    /// Counter-party user ID.
    pub counter_party_id: Uuid,
    /// Counter-party taxpayer id snapshot.
    pub counter_party_taxpayer_id: String,
    /// Period start.
    pub period_start: String,
    /// Period end.
    pub period_end: String,
    /// Aggregate debit.
    pub total_debit: String,
    /// Aggregate credit.
    pub total_credit: String,
    /// Net balance.
    pub net_balance: String,
    /// Line count.
    pub line_count: i32,
    /// Status.
    pub status: String,
    /// Note.
    pub note: String,
    /// Rejection reason, if rejected.
    pub rejection_reason: Option<String>,
    /// Whether a detailed statement was requested on rejection.
    pub statement_requested: bool,
    /// Sent timestamp.
    pub sent_at: Option<String>,
    /// Approved timestamp.
    pub approved_at: Option<String>,
    /// Rejected timestamp.
    pub rejected_at: Option<String>,
    /// Created timestamp.
    pub created_at: String,
    /// Lines, present on detail reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<LineResponse>>,
}

/// Response for a document line.
#[derive(Debug, Serialize)]
pub struct LineResponse {
    /// Line ID.
    pub id: Uuid,
    /// Sub-account code.
    pub subaccount_code: String,
    /// Sub-account display name snapshot.
    pub subaccount_name: Option<String>,
    /// Signed balance.
    pub balance: String,
}

fn line_to_response(line: document_lines::Model) -> LineResponse {
    LineResponse {
        id: line.id,
        subaccount_code: line.subaccount_code,
        subaccount_name: line.subaccount_name,
        balance: line.balance.to_string(),
    }
}

fn document_to_response(
    document: documents::Model,
    lines: Option<Vec<document_lines::Model>>,
) -> DocumentResponse {
    DocumentResponse {
        id: document.id,
        document_number: document.document_number,
        company_id: document.company_id,
        issuer_id: document.issuer_id,
        counter_party_id: document.counter_party_id,
        counter_party_taxpayer_id: document.counter_party_taxpayer_id,
        period_start: document.period_start.to_string(),
        period_end: document.period_end.to_string(),
        total_debit: document.total_debit.to_string(),
        total_credit: document.total_credit.to_string(),
        net_balance: document.net_balance.to_string(),
        line_count: document.line_count,
        status: document.status.as_core().to_string(),
        note: document.note,
        rejection_reason: document.rejection_reason,
        statement_requested: document.statement_requested,
        sent_at: document.sent_at.map(|t| t.to_rfc3339()),
        approved_at: document.approved_at.map(|t| t.to_rfc3339()),
        rejected_at: document.rejected_at.map(|t| t.to_rfc3339()),
        created_at: document.created_at.to_rfc3339(),
        lines: lines.map(|l| l.into_iter().map(line_to_response).collect()),
    }
}

// ============================================================================
// Error helpers
// ============================================================================

pub(crate) fn forbidden_role() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "unknown_role",
            "message": "Token carries an unknown role"
        })),
    )
        .into_response()
}

pub(crate) fn actor_of(auth: &AuthUser) -> Result<Actor, Response> {
    auth.actor().ok_or_else(forbidden_role)
}

pub(crate) fn app_error_response(e: &balanco_shared::AppError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string(),
        })),
    )
        .into_response()
}

pub(crate) fn lifecycle_error_response(e: &LifecycleError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string(),
        })),
    )
        .into_response()
}

fn document_error_response(e: &DocumentError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string(),
        })),
    )
        .into_response()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /documents - List documents visible to the caller.
async fn list_documents(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListDocumentsQuery>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let page = PageRequest {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20).min(100),
    };

    let filter = DocumentFilter {
        status: query
            .status
            .as_deref()
            .and_then(CoreStatus::parse)
            .map(Into::into),
        period_from: query.from,
        period_to: query.to,
        taxpayer_id: query.taxpayer_id,
    };

    let repo = DocumentRepository::new((*state.db).clone());
    match repo.list(&actor, filter, page.offset(), page.limit()).await {
        Ok((items, total)) => {
            let data: Vec<DocumentResponse> = items
                .into_iter()
                .map(|d| document_to_response(d, None))
                .collect();
            (
                StatusCode::OK,
                Json(PageResponse::new(data, page.page, page.per_page, total)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list documents");
            document_error_response(&e)
        }
    }
}

/// POST /documents - Manual single-document creation (Draft).
async fn create_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateDocumentRequest>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    if payload.period_start > payload.period_end {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "INVALID_PERIOD",
                "message": "period_start must not be after period_end"
            })),
        )
            .into_response();
    }

    let repo = DocumentRepository::new((*state.db).clone());
    let input = CreateDocumentInput {
        counter_party_id: payload.counter_party_id,
        period_start: payload.period_start,
        period_end: payload.period_end,
        total_debit: payload.total_debit,
        total_credit: payload.total_credit,
        note: payload.note,
    };

    match repo
        .create_manual(&actor, input, &state.reconciliation.document_prefix)
        .await
    {
        Ok(document) => {
            info!(document_id = %document.id, "Document created manually");
            (
                StatusCode::CREATED,
                Json(document_to_response(document, None)),
            )
                .into_response()
        }
        Err(e) => document_error_response(&e),
    }
}

/// GET /documents/{document_id} - Document detail with lines.
async fn get_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<Uuid>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = DocumentRepository::new((*state.db).clone());
    let document = match repo.get(&actor, document_id).await {
        Ok(d) => d,
        Err(e) => return document_error_response(&e),
    };

    match repo.lines(document_id).await {
        Ok(lines) => (
            StatusCode::OK,
            Json(document_to_response(document, Some(lines))),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load document lines");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}

/// PATCH /documents/{document_id} - Draft-only edits, issuer only.
async fn update_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = DocumentRepository::new((*state.db).clone());
    let input = UpdateDraftInput {
        period_start: payload.period_start,
        period_end: payload.period_end,
        total_debit: payload.total_debit,
        total_credit: payload.total_credit,
        note: payload.note,
    };

    match repo.update_draft(&actor, document_id, input).await {
        Ok(document) => (StatusCode::OK, Json(document_to_response(document, None))).into_response(),
        Err(e) => document_error_response(&e),
    }
}

/// DELETE /documents/{document_id} - Draft-only hard delete, issuer only.
async fn delete_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<Uuid>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = DocumentRepository::new((*state.db).clone());
    match repo.delete_draft(&actor, document_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => document_error_response(&e),
    }
}

/// POST /documents/{document_id}/send - Draft → Sent with token issuance.
///
/// The approval link is delivered over SMS after the transition commits;
/// delivery failure is logged and never rolls the transition back.
async fn send_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<Uuid>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = LifecycleRepository::new((*state.db).clone());
    let (document, token) = match repo
        .send_document(&actor, document_id, state.reconciliation.token_ttl_hours)
        .await
    {
        Ok(result) => result,
        Err(e) => return lifecycle_error_response(&e),
    };

    info!(document_id = %document.id, "Document sent");

    dispatch_approval_sms(&state, &document, token);

    (StatusCode::OK, Json(document_to_response(document, None))).into_response()
}

/// POST /documents/{document_id}/approve - Sent → Approved, authenticated.
///
/// Only the named counter-party may call this; the outstanding token is
/// retired in the same transaction.
async fn approve_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<Uuid>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = LifecycleRepository::new((*state.db).clone());
    match repo.approve_as_counter_party(&actor, document_id).await {
        Ok(document) => {
            info!(document_id = %document.id, "Document approved by counter-party");
            crate::routes::approval::dispatch_issuer_notice(&state, &document, None);
            (StatusCode::OK, Json(document_to_response(document, None))).into_response()
        }
        Err(e) => lifecycle_error_response(&e),
    }
}

/// Request body for an authenticated rejection.
#[derive(Debug, Deserialize)]
pub struct RejectDocumentRequest {
    /// Non-empty reason for the dispute.
    pub reason: String,
    /// Whether the counter-party wants a detailed statement.
    #[serde(default)]
    pub request_statement: bool,
}

/// POST /documents/{document_id}/reject - Sent → Rejected, authenticated.
async fn reject_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<RejectDocumentRequest>,
) -> Response {
    let actor = match actor_of(&auth) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = LifecycleRepository::new((*state.db).clone());
    match repo
        .reject_as_counter_party(
            &actor,
            document_id,
            payload.reason.clone(),
            payload.request_statement,
        )
        .await
    {
        Ok(document) => {
            info!(document_id = %document.id, "Document rejected by counter-party");
            crate::routes::approval::dispatch_issuer_notice(&state, &document, Some(payload.reason));
            (StatusCode::OK, Json(document_to_response(document, None))).into_response()
        }
        Err(e) => lifecycle_error_response(&e),
    }
}

/// Fire-and-forget SMS dispatch after the transition has committed.
fn dispatch_approval_sms(state: &AppState, document: &documents::Model, token: String) {
    let user_repo = UserRepository::new((*state.db).clone());
    let sms = state.sms_service.clone();
    let counter_party_id = document.counter_party_id;
    let document_number = document.document_number.clone();

    tokio::spawn(async move {
        let phone = match user_repo.find_by_id(counter_party_id).await {
            Ok(Some(user)) => user.phone,
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "Failed to load counter-party for SMS dispatch");
                return;
            }
        };

        let Some(phone) = phone else {
            warn!(
                counter_party_id = %counter_party_id,
                "Counter-party has no phone number; approval link not delivered"
            );
            return;
        };

        if let Err(e) = sms
            .send_approval_link(&phone, &document_number, &token)
            .await
        {
            // Log and continue: the transition is already durable.
            error!(error = %e, "Approval link SMS failed");
        }
    });
}
