//! Lifecycle repository: applies validated state transitions.
//!
//! The pure state machine in `balanco_core::lifecycle` decides whether a
//! transition is legal; this repository makes it durable. Each transition is
//! one database transaction, and token consumption happens inside the same
//! transaction as the transition it authorizes. Racing callers are
//! serialized by conditional updates: at most one wins, the loser sees a
//! state-conflict error instead of silently succeeding.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use balanco_core::lifecycle::{
    Actor, DocumentStatus as CoreStatus, LifecycleAction, LifecycleError, LifecycleService,
    authorize_counter_party, authorize_send,
};
use balanco_core::token::generate_approval_token;

use crate::entities::{documents, sea_orm_active_enums::DocumentStatus};
use crate::repositories::approval_token::ApprovalTokenRepository;
use crate::repositories::document::document_ref;

/// Lifecycle repository for document state transitions.
#[derive(Debug, Clone)]
pub struct LifecycleRepository {
    db: DatabaseConnection,
}

impl LifecycleRepository {
    /// Creates a new lifecycle repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Draft → Sent: issues a fresh approval token and dispatches.
    ///
    /// Issuing overwrites any earlier token and clears its consumed state,
    /// implicitly revoking it. Returns the updated document together with
    /// the raw token for out-of-band delivery; the token is never returned
    /// through any other read path.
    ///
    /// # Errors
    ///
    /// Returns a guard error, `InvalidTransition` when the document is not a
    /// draft, or a database error.
    pub async fn send_document(
        &self,
        actor: &Actor,
        document_id: Uuid,
        token_ttl_hours: i64,
    ) -> Result<(documents::Model, String), LifecycleError> {
        let document = documents::Entity::find_by_id(document_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LifecycleError::DocumentNotFound(document_id))?;

        authorize_send(actor, &document_ref(&document))?;

        let token = generate_approval_token();
        let expires_at = Utc::now() + Duration::hours(token_ttl_hours);
        let action = LifecycleService::send(
            document.status.as_core(),
            token.clone(),
            expires_at,
            actor.user_id,
        )?;

        let LifecycleAction::Send {
            token, sent_at, ..
        } = action
        else {
            unreachable!("send always yields a Send action");
        };

        // Conditional update: a concurrent dispatch of the same draft loses
        // here instead of silently re-issuing.
        let result = documents::Entity::update_many()
            .col_expr(documents::Column::Status, Expr::value(DocumentStatus::Sent))
            .col_expr(
                documents::Column::ApprovalToken,
                Expr::value(Some(token.clone())),
            )
            .col_expr(documents::Column::TokenConsumed, Expr::value(false))
            .col_expr(
                documents::Column::TokenConsumedAt,
                Expr::value(None::<chrono::DateTime<Utc>>),
            )
            .col_expr(documents::Column::TokenExpiresAt, Expr::value(Some(expires_at)))
            .col_expr(documents::Column::SentAt, Expr::value(Some(sent_at)))
            .col_expr(documents::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(documents::Column::Id.eq(document_id))
            .filter(documents::Column::Status.eq(DocumentStatus::Draft))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(LifecycleError::InvalidTransition {
                from: CoreStatus::Sent,
                to: CoreStatus::Sent,
            });
        }

        let updated = self.reload(document_id).await?;
        Ok((updated, token))
    }

    /// Sent → Approved via the bearer token channel.
    ///
    /// Verification, consumption, and the transition run in one database
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns a token error (invalid/consumed/expired) or a wrong-state
    /// error.
    pub async fn approve_with_token(
        &self,
        token: &str,
    ) -> Result<documents::Model, LifecycleError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let document = ApprovalTokenRepository::verify_in(&txn, token).await?;
        let action = LifecycleService::approve(document.status.as_core())?;

        // Exactly one concurrent approve/reject wins this compare-and-swap.
        ApprovalTokenRepository::consume(&txn, token).await?;

        let LifecycleAction::Approve { approved_at, .. } = action else {
            unreachable!("approve always yields an Approve action");
        };

        let mut active: documents::ActiveModel = document.into();
        active.status = Set(DocumentStatus::Approved);
        active.approved_at = Set(Some(approved_at.into()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Sent → Rejected via the bearer token channel.
    ///
    /// # Errors
    ///
    /// Returns `RejectionReasonRequired` for an empty reason, a token error,
    /// or a wrong-state error.
    pub async fn reject_with_token(
        &self,
        token: &str,
        reason: String,
        statement_requested: bool,
    ) -> Result<documents::Model, LifecycleError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let document = ApprovalTokenRepository::verify_in(&txn, token).await?;
        let action =
            LifecycleService::reject(document.status.as_core(), reason, statement_requested)?;

        ApprovalTokenRepository::consume(&txn, token).await?;

        let LifecycleAction::Reject {
            rejection_reason,
            statement_requested,
            rejected_at,
            ..
        } = action
        else {
            unreachable!("reject always yields a Reject action");
        };

        let mut active: documents::ActiveModel = document.into();
        active.status = Set(DocumentStatus::Rejected);
        active.rejection_reason = Set(Some(rejection_reason));
        active.statement_requested = Set(statement_requested);
        active.rejected_at = Set(Some(rejected_at.into()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Sent → Approved by the authenticated counter-party.
    ///
    /// The outstanding token (if any) is consumed alongside, so it cannot be
    /// replayed after the document reaches a terminal state.
    ///
    /// # Errors
    ///
    /// Returns `NotCounterParty`, a wrong-state error, or a database error.
    pub async fn approve_as_counter_party(
        &self,
        actor: &Actor,
        document_id: Uuid,
    ) -> Result<documents::Model, LifecycleError> {
        let document = self.load_for_counter_party(actor, document_id).await?;
        let action = LifecycleService::approve(document.status.as_core())?;

        let LifecycleAction::Approve { approved_at, .. } = action else {
            unreachable!("approve always yields an Approve action");
        };

        let txn = self.db.begin().await.map_err(db_err)?;
        Self::apply_terminal(
            &txn,
            document_id,
            CoreStatus::Approved,
            documents::ActiveModel {
                status: Set(DocumentStatus::Approved),
                approved_at: Set(Some(approved_at.into())),
                ..Default::default()
            },
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        self.reload(document_id).await
    }

    /// Sent → Rejected by the authenticated counter-party.
    ///
    /// # Errors
    ///
    /// Returns `NotCounterParty`, `RejectionReasonRequired`, a wrong-state
    /// error, or a database error.
    pub async fn reject_as_counter_party(
        &self,
        actor: &Actor,
        document_id: Uuid,
        reason: String,
        statement_requested: bool,
    ) -> Result<documents::Model, LifecycleError> {
        let document = self.load_for_counter_party(actor, document_id).await?;
        let action =
            LifecycleService::reject(document.status.as_core(), reason, statement_requested)?;

        let LifecycleAction::Reject {
            rejection_reason,
            statement_requested,
            rejected_at,
            ..
        } = action
        else {
            unreachable!("reject always yields a Reject action");
        };

        let txn = self.db.begin().await.map_err(db_err)?;
        Self::apply_terminal(
            &txn,
            document_id,
            CoreStatus::Rejected,
            documents::ActiveModel {
                status: Set(DocumentStatus::Rejected),
                rejection_reason: Set(Some(rejection_reason)),
                statement_requested: Set(statement_requested),
                rejected_at: Set(Some(rejected_at.into())),
                ..Default::default()
            },
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        self.reload(document_id).await
    }

    async fn load_for_counter_party(
        &self,
        actor: &Actor,
        document_id: Uuid,
    ) -> Result<documents::Model, LifecycleError> {
        let document = documents::Entity::find_by_id(document_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LifecycleError::DocumentNotFound(document_id))?;

        authorize_counter_party(actor, &document_ref(&document))?;
        Ok(document)
    }

    /// Applies a terminal transition with a status guard, retiring the
    /// outstanding token in the same statement.
    async fn apply_terminal(
        txn: &sea_orm::DatabaseTransaction,
        document_id: Uuid,
        to: CoreStatus,
        mut patch: documents::ActiveModel,
    ) -> Result<(), LifecycleError> {
        patch.token_consumed = Set(true);
        patch.token_consumed_at = Set(Some(Utc::now().into()));
        patch.updated_at = Set(Utc::now().into());

        let result = documents::Entity::update_many()
            .set(patch)
            .filter(documents::Column::Id.eq(document_id))
            .filter(documents::Column::Status.eq(DocumentStatus::Sent))
            .exec(txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            // A concurrent caller already moved the document out of Sent.
            return Err(LifecycleError::InvalidTransition {
                from: CoreStatus::Sent,
                to,
            });
        }
        Ok(())
    }

    async fn reload(&self, document_id: Uuid) -> Result<documents::Model, LifecycleError> {
        documents::Entity::find_by_id(document_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LifecycleError::DocumentNotFound(document_id))
    }
}

fn db_err(e: DbErr) -> LifecycleError {
    LifecycleError::Database(e.to_string())
}
