//! Document repository for reconciliation document database operations.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use balanco_core::lifecycle::{
    Actor, DocumentRef, LifecycleError, LifecycleService, Role, authorize_delete, authorize_edit,
    authorize_read,
};
use balanco_core::token::generate_document_number;

use crate::entities::{document_lines, documents, sea_orm_active_enums::DocumentStatus, users};

/// Error types for document operations.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Document not found.
    #[error("Document not found: {0}")]
    NotFound(Uuid),

    /// Counter-party user not found.
    #[error("Counter-party not found: {0}")]
    CounterPartyNotFound(Uuid),

    /// Lifecycle rule violation (wrong state, guard failure).
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl DocumentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::CounterPartyNotFound(_) => 404,
            Self::Lifecycle(e) => e.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::CounterPartyNotFound(_) => "COUNTER_PARTY_NOT_FOUND",
            Self::Lifecycle(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Input for the manual single-document creation path.
#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    /// The named counter-party user.
    pub counter_party_id: Uuid,
    /// Period start date.
    pub period_start: NaiveDate,
    /// Period end date.
    pub period_end: NaiveDate,
    /// Aggregate debit.
    pub total_debit: Decimal,
    /// Aggregate credit.
    pub total_credit: Decimal,
    /// Free-text note.
    pub note: String,
}

/// In-place edits allowed while a document is still a draft.
#[derive(Debug, Clone, Default)]
pub struct UpdateDraftInput {
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

/// Filter options for listing documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Filter by status.
    pub status: Option<DocumentStatus>,
    /// Filter by period overlap start.
    pub period_from: Option<NaiveDate>,
    /// Filter by period overlap end.
    pub period_to: Option<NaiveDate>,
    /// Filter by counter-party taxpayer id.
    pub taxpayer_id: Option<String>,
}

/// Builds the guard view of a document row.
#[must_use]
pub fn document_ref(model: &documents::Model) -> DocumentRef {
    DocumentRef {
        company_id: model.company_id,
        issuer_id: model.issuer_id,
        counter_party_id: model.counter_party_id,
    }
}

/// Document repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
}

impl DocumentRepository {
    /// Creates a new document repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a single draft document manually.
    ///
    /// The document lands in the counter-party's company, never the actor's
    /// own when they differ (cross-tenant system administrators). The net
    /// balance is always `total_debit - total_credit`, matching the bulk
    /// consolidation path.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter-party does not exist, the actor's
    /// role or company does not allow issuing for it, or the insert fails.
    pub async fn create_manual(
        &self,
        actor: &Actor,
        input: CreateDocumentInput,
        document_prefix: &str,
    ) -> Result<documents::Model, DocumentError> {
        let counter_party = users::Entity::find_by_id(input.counter_party_id)
            .one(&self.db)
            .await?
            .ok_or(DocumentError::CounterPartyNotFound(input.counter_party_id))?;

        if !actor.role.can_dispatch() {
            return Err(LifecycleError::RoleForbidden { role: actor.role }.into());
        }
        if actor.role != Role::SystemAdmin && actor.company_id != counter_party.company_id {
            return Err(LifecycleError::CompanyMismatch.into());
        }

        let now = Utc::now();
        let taxpayer_id = counter_party.taxpayer_id.clone().unwrap_or_default();

        let document = documents::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(counter_party.company_id),
            document_number: Set(generate_document_number(document_prefix, now)),
            issuer_id: Set(actor.user_id),
            counter_party_id: Set(counter_party.id),
            counter_party_taxpayer_id: Set(taxpayer_id),
            period_start: Set(input.period_start),
            period_end: Set(input.period_end),
            total_debit: Set(input.total_debit),
            total_credit: Set(input.total_credit),
            net_balance: Set(input.total_debit - input.total_credit),
            line_count: Set(0),
            status: Set(DocumentStatus::Draft),
            note: Set(input.note),
            rejection_reason: Set(None),
            statement_requested: Set(false),
            approval_token: Set(None),
            token_consumed: Set(false),
            token_consumed_at: Set(None),
            token_expires_at: Set(None),
            sent_at: Set(None),
            approved_at: Set(None),
            rejected_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(document.insert(&self.db).await?)
    }

    /// Lists documents visible to the actor, most recent first.
    ///
    /// Scope: a system admin sees every tenant; staff roles see their own
    /// company; a counter-party sees only documents naming it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: DocumentFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<documents::Model>, u64), DocumentError> {
        let mut query = documents::Entity::find();

        query = match actor.role {
            Role::SystemAdmin => query,
            Role::CounterParty => {
                query.filter(documents::Column::CounterPartyId.eq(actor.user_id))
            }
            Role::CompanyAdmin | Role::Accounting | Role::Planning => {
                query.filter(documents::Column::CompanyId.eq(actor.company_id))
            }
        };

        if let Some(status) = filter.status {
            query = query.filter(documents::Column::Status.eq(status));
        }
        if let Some(from) = filter.period_from {
            query = query.filter(documents::Column::PeriodEnd.gte(from));
        }
        if let Some(to) = filter.period_to {
            query = query.filter(documents::Column::PeriodStart.lte(to));
        }
        if let Some(taxpayer_id) = filter.taxpayer_id {
            query = query.filter(documents::Column::CounterPartyTaxpayerId.eq(taxpayer_id));
        }

        let total = query.clone().count(&self.db).await?;

        let items = query
            .order_by_desc(documents::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// Gets one document the actor is allowed to read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and a guard error when the actor
    /// has no relationship to the document.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<documents::Model, DocumentError> {
        let document = documents::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DocumentError::NotFound(id))?;

        authorize_read(actor, &document_ref(&document))?;
        Ok(document)
    }

    /// Gets the lines of a document, in input order.
    ///
    /// Lines are never queried outside their parent; callers go through
    /// [`Self::get`] first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn lines(&self, document_id: Uuid) -> Result<Vec<document_lines::Model>, DbErr> {
        document_lines::Entity::find()
            .filter(document_lines::Column::DocumentId.eq(document_id))
            .order_by_asc(document_lines::Column::Position)
            .all(&self.db)
            .await
    }

    /// Applies in-place edits to a draft.
    ///
    /// Only the original issuer, only while the document is in `Draft`. The
    /// net balance is recomputed from the resulting totals.
    ///
    /// # Errors
    ///
    /// Returns a guard error, a wrong-state error, or a database error.
    pub async fn update_draft(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateDraftInput,
    ) -> Result<documents::Model, DocumentError> {
        let document = documents::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DocumentError::NotFound(id))?;

        authorize_edit(actor, &document_ref(&document))?;
        LifecycleService::can_edit(document.status.as_core())?;

        let debit = input.total_debit.unwrap_or(document.total_debit);
        let credit = input.total_credit.unwrap_or(document.total_credit);

        let mut active: documents::ActiveModel = document.into();
        if let Some(period_start) = input.period_start {
            active.period_start = Set(period_start);
        }
        if let Some(period_end) = input.period_end {
            active.period_end = Set(period_end);
        }
        if let Some(note) = input.note {
            active.note = Set(note);
        }
        active.total_debit = Set(debit);
        active.total_credit = Set(credit);
        active.net_balance = Set(debit - credit);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Hard-deletes a draft; lines cascade.
    ///
    /// Only the original issuer, only while the document is in `Draft`.
    ///
    /// # Errors
    ///
    /// Returns a guard error, a wrong-state error, or a database error.
    pub async fn delete_draft(&self, actor: &Actor, id: Uuid) -> Result<(), DocumentError> {
        let document = documents::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DocumentError::NotFound(id))?;

        authorize_delete(actor, &document_ref(&document))?;
        LifecycleService::can_delete(document.status.as_core())?;

        documents::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
