//! Lifecycle service for document state transitions.
//!
//! Implements the core state machine. All methods are associated functions
//! that validate a transition against the current status and return the
//! `LifecycleAction` the persistence layer applies, with audit stamps.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::types::{DocumentStatus, LifecycleAction};

/// Stateless service for managing document lifecycle transitions.
pub struct LifecycleService;

impl LifecycleService {
    /// Dispatch a draft document to its counter-party.
    ///
    /// The caller supplies the freshly generated approval token; issuing a
    /// token is only possible through this transition, and the returned
    /// action overwrites any token from an earlier dispatch attempt.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::InvalidTransition` if the document is not in
    /// `Draft` status — re-sending an already-sent document is rejected, not
    /// silently repeated.
    pub fn send(
        current_status: DocumentStatus,
        token: String,
        token_expires_at: DateTime<Utc>,
        sent_by: Uuid,
    ) -> Result<LifecycleAction, LifecycleError> {
        match current_status {
            DocumentStatus::Draft => Ok(LifecycleAction::Send {
                new_status: DocumentStatus::Sent,
                token,
                token_expires_at,
                sent_by,
                sent_at: Utc::now(),
            }),
            _ => Err(LifecycleError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Sent,
            }),
        }
    }

    /// Counter-party accepts a sent document.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::InvalidTransition` if the document is not in
    /// `Sent` status. A second approve attempt on an already-approved
    /// document therefore fails with a distinguishable wrong-state error
    /// instead of silently succeeding.
    pub fn approve(current_status: DocumentStatus) -> Result<LifecycleAction, LifecycleError> {
        match current_status {
            DocumentStatus::Sent => Ok(LifecycleAction::Approve {
                new_status: DocumentStatus::Approved,
                approved_at: Utc::now(),
            }),
            _ => Err(LifecycleError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Approved,
            }),
        }
    }

    /// Counter-party disputes a sent document.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::RejectionReasonRequired` if the reason is
    /// empty or whitespace, and `LifecycleError::InvalidTransition` if the
    /// document is not in `Sent` status.
    pub fn reject(
        current_status: DocumentStatus,
        rejection_reason: String,
        statement_requested: bool,
    ) -> Result<LifecycleAction, LifecycleError> {
        if rejection_reason.trim().is_empty() {
            return Err(LifecycleError::RejectionReasonRequired);
        }

        match current_status {
            DocumentStatus::Sent => Ok(LifecycleAction::Reject {
                new_status: DocumentStatus::Rejected,
                rejection_reason,
                statement_requested,
                rejected_at: Utc::now(),
            }),
            _ => Err(LifecycleError::InvalidTransition {
                from: current_status,
                to: DocumentStatus::Rejected,
            }),
        }
    }

    /// Checks that in-place field edits are still allowed.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::NotEditable` for any non-draft status.
    pub fn can_edit(status: DocumentStatus) -> Result<(), LifecycleError> {
        if status.is_editable() {
            Ok(())
        } else {
            Err(LifecycleError::NotEditable { status })
        }
    }

    /// Checks that hard deletion is still allowed.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::CanOnlyDeleteDraft` for any non-draft status.
    pub fn can_delete(status: DocumentStatus) -> Result<(), LifecycleError> {
        match status {
            DocumentStatus::Draft => Ok(()),
            _ => Err(LifecycleError::CanOnlyDeleteDraft),
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → Sent (dispatch)
    /// - Sent → Approved (approve)
    /// - Sent → Rejected (reject)
    #[must_use]
    pub fn is_valid_transition(from: DocumentStatus, to: DocumentStatus) -> bool {
        matches!(
            (from, to),
            (DocumentStatus::Draft, DocumentStatus::Sent)
                | (
                    DocumentStatus::Sent,
                    DocumentStatus::Approved | DocumentStatus::Rejected
                )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_expiry() -> DateTime<Utc> {
        Utc::now() + Duration::hours(72)
    }

    #[test]
    fn test_send_from_draft() {
        let result = LifecycleService::send(
            DocumentStatus::Draft,
            "tok".to_string(),
            token_expiry(),
            Uuid::new_v4(),
        );
        let action = result.unwrap();
        assert_eq!(action.new_status(), DocumentStatus::Sent);
    }

    #[test]
    fn test_resend_is_rejected() {
        // A document already in Sent cannot be sent again.
        let result = LifecycleService::send(
            DocumentStatus::Sent,
            "tok".to_string(),
            token_expiry(),
            Uuid::new_v4(),
        );
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition {
                from: DocumentStatus::Sent,
                to: DocumentStatus::Sent
            })
        ));
    }

    #[test]
    fn test_approve_from_sent() {
        let result = LifecycleService::approve(DocumentStatus::Sent);
        assert_eq!(result.unwrap().new_status(), DocumentStatus::Approved);
    }

    #[test]
    fn test_approve_twice_fails_with_wrong_state() {
        // Idempotence requirement: the second call errors, never no-ops.
        let result = LifecycleService::approve(DocumentStatus::Approved);
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition {
                from: DocumentStatus::Approved,
                ..
            })
        ));
    }

    #[test]
    fn test_approve_from_draft_fails() {
        let result = LifecycleService::approve(DocumentStatus::Draft);
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_reject_from_sent() {
        let result =
            LifecycleService::reject(DocumentStatus::Sent, "Balance mismatch".to_string(), true);
        let action = result.unwrap();
        assert_eq!(action.new_status(), DocumentStatus::Rejected);
        match action {
            LifecycleAction::Reject {
                statement_requested,
                ..
            } => assert!(statement_requested),
            _ => panic!("expected Reject action"),
        }
    }

    #[test]
    fn test_reject_empty_reason_fails() {
        let result = LifecycleService::reject(DocumentStatus::Sent, String::new(), false);
        assert!(matches!(
            result,
            Err(LifecycleError::RejectionReasonRequired)
        ));
    }

    #[test]
    fn test_reject_whitespace_reason_fails() {
        let result = LifecycleService::reject(DocumentStatus::Sent, "   ".to_string(), false);
        assert!(matches!(
            result,
            Err(LifecycleError::RejectionReasonRequired)
        ));
    }

    #[test]
    fn test_reject_terminal_fails() {
        let result =
            LifecycleService::reject(DocumentStatus::Rejected, "again".to_string(), false);
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_edit_only_in_draft() {
        assert!(LifecycleService::can_edit(DocumentStatus::Draft).is_ok());
        for status in [
            DocumentStatus::Sent,
            DocumentStatus::Approved,
            DocumentStatus::Rejected,
        ] {
            assert!(matches!(
                LifecycleService::can_edit(status),
                Err(LifecycleError::NotEditable { .. })
            ));
        }
    }

    #[test]
    fn test_delete_only_in_draft() {
        assert!(LifecycleService::can_delete(DocumentStatus::Draft).is_ok());
        for status in [
            DocumentStatus::Sent,
            DocumentStatus::Approved,
            DocumentStatus::Rejected,
        ] {
            assert!(matches!(
                LifecycleService::can_delete(status),
                Err(LifecycleError::CanOnlyDeleteDraft)
            ));
        }
    }

    #[test]
    fn test_transition_table_is_exact() {
        use DocumentStatus::{Approved, Draft, Rejected, Sent};

        // From Draft, exactly one forward transition.
        assert!(LifecycleService::is_valid_transition(Draft, Sent));
        assert!(!LifecycleService::is_valid_transition(Draft, Approved));
        assert!(!LifecycleService::is_valid_transition(Draft, Rejected));

        // From Sent, exactly two forward transitions.
        assert!(LifecycleService::is_valid_transition(Sent, Approved));
        assert!(LifecycleService::is_valid_transition(Sent, Rejected));
        assert!(!LifecycleService::is_valid_transition(Sent, Draft));

        // Approved and Rejected are terminal; no path returns to Draft.
        for from in [Approved, Rejected] {
            for to in [Draft, Sent, Approved, Rejected] {
                assert!(!LifecycleService::is_valid_transition(from, to));
            }
        }
    }
}
