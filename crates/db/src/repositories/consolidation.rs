//! Consolidation repository: turns a batch of raw ledger rows into draft
//! reconciliation documents.
//!
//! The pure pipeline (normalize, group, aggregate) lives in
//! `balanco_core::reconcile`; this repository persists its output. All
//! groups share one outer transaction committed once at the end, but every
//! group runs inside its own savepoint so the reported created/failed counts
//! describe what actually persisted: a uniqueness violation in one group
//! rolls back that group alone and processing continues.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait, sea_query::Expr,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use balanco_core::auth::{counter_party_username, default_counter_party_password, hash_password};
use balanco_core::lifecycle::Actor;
use balanco_core::reconcile::{EntryGroup, RawRow, ReconcileError, group_entries, normalize_row};
use balanco_core::token::generate_document_number;
use balanco_shared::config::ReconciliationConfig;
use balanco_shared::types::DocumentId;

use crate::entities::{
    document_lines, documents,
    sea_orm_active_enums::{DocumentStatus, UserRole},
    subaccounts, users,
};

/// Error types for batch consolidation.
#[derive(Debug, thiserror::Error)]
pub enum ConsolidationError {
    /// Batch-level validation failure, raised before any row is processed.
    #[error(transparent)]
    Batch(#[from] ReconcileError),

    /// Database error on the outer transaction.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ConsolidationError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Batch(e) => e.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Batch(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Settings consumed by one consolidation run.
#[derive(Debug, Clone)]
pub struct ConsolidationSettings {
    /// Maximum accepted batch size, in rows.
    pub max_batch_rows: usize,
    /// Prefix for generated document numbers.
    pub document_prefix: String,
}

impl From<&ReconciliationConfig> for ConsolidationSettings {
    fn from(config: &ReconciliationConfig) -> Self {
        Self {
            max_batch_rows: config.max_batch_rows,
            document_prefix: config.document_prefix.clone(),
        }
    }
}

/// One failed row, keyed by its 1-based row number.
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// 1-based row number in the uploaded batch.
    pub row: usize,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Summary of one created document.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedDocument {
    /// Document id.
    pub id: DocumentId,
    /// Generated document number.
    pub document_number: String,
    /// Counter-party taxpayer id.
    pub taxpayer_id: String,
    /// Period start.
    pub period_start: NaiveDate,
    /// Period end.
    pub period_end: NaiveDate,
    /// Aggregate debit.
    pub total_debit: Decimal,
    /// Aggregate credit.
    pub total_credit: Decimal,
    /// Net balance (`total_debit - total_credit`).
    pub net_balance: Decimal,
    /// Number of lines.
    pub line_count: usize,
}

/// Structured result of one consolidation batch.
///
/// Every input row is accounted for exactly once: it either contributed to
/// a created document or appears in `errors` — never both, never neither.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Number of documents created.
    pub created_count: usize,
    /// Number of rows that failed (normalization or group persistence).
    pub failed_count: usize,
    /// Per-row failures.
    pub errors: Vec<RowFailure>,
    /// Created document summaries, in group order.
    pub documents: Vec<CreatedDocument>,
}

/// Consolidation repository.
#[derive(Debug, Clone)]
pub struct ConsolidationRepository {
    db: DatabaseConnection,
}

impl ConsolidationRepository {
    /// Creates a new consolidation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Runs one consolidation batch for the actor's company.
    ///
    /// # Errors
    ///
    /// Returns `Batch` when the row count exceeds the configured maximum
    /// (checked before any row is processed), or `Database` when the outer
    /// transaction itself fails. Row- and group-level failures never error
    /// the batch; they are collected into the result.
    pub async fn consolidate(
        &self,
        actor: &Actor,
        rows: Vec<RawRow>,
        settings: &ConsolidationSettings,
    ) -> Result<BatchResult, ConsolidationError> {
        if rows.len() > settings.max_batch_rows {
            return Err(ReconcileError::BatchTooLarge {
                actual: rows.len(),
                max: settings.max_batch_rows,
            }
            .into());
        }

        let mut errors: Vec<RowFailure> = Vec::new();
        let mut entries = Vec::with_capacity(rows.len());

        for (index, raw) in rows.iter().enumerate() {
            match normalize_row(index + 1, raw) {
                Ok(entry) => entries.push(entry),
                Err(e) => errors.push(RowFailure {
                    row: e.row,
                    reason: e.reason.to_string(),
                }),
            }
        }

        let groups = group_entries(entries);
        let mut documents = Vec::with_capacity(groups.len());

        let txn = self.db.begin().await?;

        for group in &groups {
            // Savepoint per group: a failure rolls back this group alone.
            let savepoint = txn.begin().await?;
            match Self::persist_group(&savepoint, actor, group, settings).await {
                Ok(summary) => {
                    savepoint.commit().await?;
                    documents.push(summary);
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    warn!(
                        taxpayer_id = %group.key.taxpayer_id,
                        period_start = %group.key.period_start,
                        error = %e,
                        "Consolidation group not persisted"
                    );
                    for entry in &group.entries {
                        errors.push(RowFailure {
                            row: entry.row,
                            reason: format!("group not persisted: {e}"),
                        });
                    }
                }
            }
        }

        txn.commit().await?;

        errors.sort_by_key(|e| e.row);

        Ok(BatchResult {
            created_count: documents.len(),
            failed_count: errors.len(),
            errors,
            documents,
        })
    }

    /// Persists one group: counter-party resolution, document + lines,
    /// registry upserts.
    async fn persist_group(
        txn: &DatabaseTransaction,
        actor: &Actor,
        group: &EntryGroup,
        settings: &ConsolidationSettings,
    ) -> Result<CreatedDocument, DbErr> {
        let counter_party =
            Self::resolve_counter_party(txn, actor.company_id, &group.key.taxpayer_id).await?;

        let totals = group.totals();
        let now = Utc::now();
        let document_id = Uuid::new_v4();
        let document_number = generate_document_number(&settings.document_prefix, now);
        let line_count = group.line_count();

        let document = documents::ActiveModel {
            id: Set(document_id),
            company_id: Set(counter_party.company_id),
            document_number: Set(document_number.clone()),
            issuer_id: Set(actor.user_id),
            counter_party_id: Set(counter_party.id),
            counter_party_taxpayer_id: Set(group.key.taxpayer_id.clone()),
            period_start: Set(group.key.period_start),
            period_end: Set(group.key.period_end),
            total_debit: Set(totals.debit),
            total_credit: Set(totals.credit),
            net_balance: Set(totals.net_balance),
            line_count: Set(i32::try_from(line_count).unwrap_or(i32::MAX)),
            status: Set(DocumentStatus::Draft),
            note: Set(group.key.note.clone()),
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
        document.insert(txn).await?;

        for (position, entry) in group.entries.iter().enumerate() {
            let line = document_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                document_id: Set(document_id),
                subaccount_code: Set(entry.subaccount_code.clone()),
                subaccount_name: Set(entry.subaccount_name.clone()),
                balance: Set(entry.amount),
                position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
                created_at: Set(now.into()),
            };
            line.insert(txn).await?;

            // Registry upsert: overwrite the balance, bump the timestamp.
            // Unknown codes are intentionally NOT auto-created — registry
            // entries pre-exist via onboarding, unlike counter-party users.
            let updated = subaccounts::Entity::update_many()
                .col_expr(subaccounts::Column::Balance, Expr::value(entry.amount))
                .col_expr(
                    subaccounts::Column::LastReconciledAt,
                    Expr::value(Some(now)),
                )
                .col_expr(subaccounts::Column::UpdatedAt, Expr::value(now))
                .filter(subaccounts::Column::CounterPartyId.eq(counter_party.id))
                .filter(subaccounts::Column::Code.eq(&entry.subaccount_code))
                .exec(txn)
                .await?;

            if updated.rows_affected == 0 {
                warn!(
                    code = %entry.subaccount_code,
                    taxpayer_id = %group.key.taxpayer_id,
                    "Sub-account not in registry; skipping balance update"
                );
            }
        }

        Ok(CreatedDocument {
            id: DocumentId::from_uuid(document_id),
            document_number,
            taxpayer_id: group.key.taxpayer_id.clone(),
            period_start: group.key.period_start,
            period_end: group.key.period_end,
            total_debit: totals.debit,
            total_credit: totals.credit,
            net_balance: totals.net_balance,
            line_count,
        })
    }

    /// Resolves the counter-party user within the given company, creating
    /// one when absent.
    ///
    /// Provisioned accounts get a deterministic username, a default password
    /// derived from the taxpayer id's trailing digits, and a forced
    /// credential rotation on first login. This is a provisioning
    /// convenience, not a security boundary.
    async fn resolve_counter_party(
        txn: &DatabaseTransaction,
        company_id: Uuid,
        taxpayer_id: &str,
    ) -> Result<users::Model, DbErr> {
        let existing = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::TaxpayerId.eq(taxpayer_id))
            .one(txn)
            .await?;

        if let Some(user) = existing {
            return Ok(user);
        }

        let password_hash = hash_password(&default_counter_party_password(taxpayer_id))
            .map_err(|e| DbErr::Custom(format!("password hashing failed: {e}")))?;

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            username: Set(counter_party_username(taxpayer_id)),
            email: Set(None),
            phone: Set(None),
            taxpayer_id: Set(Some(taxpayer_id.to_string())),
            password_hash: Set(password_hash),
            role: Set(UserRole::CounterParty),
            must_change_password: Set(true),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(txn).await
    }
}
