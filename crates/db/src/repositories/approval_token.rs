//! Approval token repository: fail-closed verification and single-use
//! consumption.
//!
//! The token is the sole credential on the unauthenticated approval channel.
//! Verification and consumption are separate operations: `verify` grants
//! read-only preview access, `consume` is called exactly once, inside the
//! same database transaction as the state transition it authorizes, so a
//! token can never be replayed after a partial failure.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    sea_query::Expr,
};

use balanco_core::lifecycle::LifecycleError;

use crate::entities::{documents, sea_orm_active_enums::DocumentStatus};

/// Approval token repository.
#[derive(Debug, Clone)]
pub struct ApprovalTokenRepository {
    db: DatabaseConnection,
}

impl ApprovalTokenRepository {
    /// Creates a new approval token repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Verifies a token and returns its owning document without consuming it.
    ///
    /// Fails closed: an unknown token, a consumed token, an expired token,
    /// or an owning document that is not currently `Sent` all reject the
    /// request.
    ///
    /// # Errors
    ///
    /// Returns `TokenInvalid`, `TokenConsumed`, or `TokenExpired`.
    pub async fn verify(&self, token: &str) -> Result<documents::Model, LifecycleError> {
        let document = documents::Entity::find()
            .filter(documents::Column::ApprovalToken.eq(token))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Self::check(document)
    }

    /// Transaction-scoped variant of [`Self::verify`], used while applying
    /// an approve/reject so the status read and the consumption see the same
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns `TokenInvalid`, `TokenConsumed`, or `TokenExpired`.
    pub async fn verify_in(
        txn: &DatabaseTransaction,
        token: &str,
    ) -> Result<documents::Model, LifecycleError> {
        let document = documents::Entity::find()
            .filter(documents::Column::ApprovalToken.eq(token))
            .one(txn)
            .await
            .map_err(db_err)?;

        Self::check(document)
    }

    /// Consumes a token: compare-and-swap on the `token_consumed` flag.
    ///
    /// Must run inside the same transaction as the state transition it
    /// authorizes. When two callers race on the same token, the conditional
    /// update lets exactly one win; the loser observes `TokenConsumed`
    /// rather than silently succeeding.
    ///
    /// # Errors
    ///
    /// Returns `TokenConsumed` when another caller got there first.
    pub async fn consume(txn: &DatabaseTransaction, token: &str) -> Result<(), LifecycleError> {
        let now = Utc::now();

        let result = documents::Entity::update_many()
            .col_expr(documents::Column::TokenConsumed, Expr::value(true))
            .col_expr(documents::Column::TokenConsumedAt, Expr::value(now))
            .filter(documents::Column::ApprovalToken.eq(token))
            .filter(documents::Column::TokenConsumed.eq(false))
            .exec(txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 1 {
            Ok(())
        } else {
            Err(LifecycleError::TokenConsumed)
        }
    }

    /// The fail-closed checks shared by both verify paths.
    fn check(document: Option<documents::Model>) -> Result<documents::Model, LifecycleError> {
        let document = document.ok_or(LifecycleError::TokenInvalid)?;

        if document.token_consumed {
            return Err(LifecycleError::TokenConsumed);
        }
        if let Some(expires_at) = document.token_expires_at
            && expires_at < Utc::now()
        {
            return Err(LifecycleError::TokenExpired);
        }
        if document.status != DocumentStatus::Sent {
            // A token pointing at a non-Sent document is useless even if it
            // was never consumed.
            return Err(LifecycleError::TokenInvalid);
        }

        Ok(document)
    }
}

fn db_err(e: DbErr) -> LifecycleError {
    LifecycleError::Database(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn sent_document(token: &str) -> documents::Model {
        let now = Utc::now().into();
        documents::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            document_number: "REC-20251001120000-a1b2".to_string(),
            issuer_id: Uuid::new_v4(),
            counter_party_id: Uuid::new_v4(),
            counter_party_taxpayer_id: "1234567890".to_string(),
            period_start: chrono::NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            period_end: chrono::NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            net_balance: Decimal::ZERO,
            line_count: 0,
            status: DocumentStatus::Sent,
            note: String::new(),
            rejection_reason: None,
            statement_requested: false,
            approval_token: Some(token.to_string()),
            token_consumed: false,
            token_consumed_at: None,
            token_expires_at: Some((Utc::now() + Duration::hours(72)).into()),
            sent_at: Some(now),
            approved_at: None,
            rejected_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_check_accepts_live_sent_token() {
        let doc = sent_document("tok");
        assert!(ApprovalTokenRepository::check(Some(doc)).is_ok());
    }

    #[test]
    fn test_check_unknown_token_fails_closed() {
        assert!(matches!(
            ApprovalTokenRepository::check(None),
            Err(LifecycleError::TokenInvalid)
        ));
    }

    #[test]
    fn test_check_consumed_token_fails_closed() {
        let mut doc = sent_document("tok");
        doc.token_consumed = true;
        assert!(matches!(
            ApprovalTokenRepository::check(Some(doc)),
            Err(LifecycleError::TokenConsumed)
        ));
    }

    #[test]
    fn test_check_expired_token_fails_closed() {
        let mut doc = sent_document("tok");
        doc.token_expires_at = Some((Utc::now() - Duration::hours(1)).into());
        assert!(matches!(
            ApprovalTokenRepository::check(Some(doc)),
            Err(LifecycleError::TokenExpired)
        ));
    }

    #[test]
    fn test_check_non_sent_document_fails_closed() {
        // Never consumed, not expired, but the document already moved on.
        for status in [
            DocumentStatus::Draft,
            DocumentStatus::Approved,
            DocumentStatus::Rejected,
        ] {
            let mut doc = sent_document("tok");
            doc.status = status;
            assert!(matches!(
                ApprovalTokenRepository::check(Some(doc)),
                Err(LifecycleError::TokenInvalid)
            ));
        }
    }
}
