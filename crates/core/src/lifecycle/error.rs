//! Lifecycle error types for document state transitions.

use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::types::{DocumentStatus, Role};

/// Errors that can occur during lifecycle operations.
///
/// Wrong-state and token-conflict errors are deliberately distinct from
/// not-found so callers can tell "never existed" from "already used".
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: DocumentStatus,
        /// The attempted target status.
        to: DocumentStatus,
    },

    /// Attempted to modify a document that is no longer a draft.
    #[error("Only draft documents can be modified (current status: {status})")]
    NotEditable {
        /// The current status.
        status: DocumentStatus,
    },

    /// Attempted to delete a document that is no longer a draft.
    #[error("Only draft documents can be deleted")]
    CanOnlyDeleteDraft,

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Caller is not the document's issuer.
    #[error("Only the document issuer may perform this action")]
    NotDocumentIssuer,

    /// Caller is not the document's named counter-party.
    #[error("Only the named counter-party may perform this action")]
    NotCounterParty,

    /// Caller's role does not allow the action.
    #[error("Role {role} is not allowed to perform this action")]
    RoleForbidden {
        /// The caller's role.
        role: Role,
    },

    /// Caller belongs to a different company than the document.
    #[error("Document belongs to a different company")]
    CompanyMismatch,

    /// Document not found.
    #[error("Document {0} not found")]
    DocumentNotFound(Uuid),

    /// Approval token is unknown.
    #[error("Approval token is invalid")]
    TokenInvalid,

    /// Approval token was already consumed.
    #[error("Approval token has already been consumed")]
    TokenConsumed,

    /// Approval token has expired.
    #[error("Approval token has expired")]
    TokenExpired,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LifecycleError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RejectionReasonRequired => 400,

            Self::NotDocumentIssuer
            | Self::NotCounterParty
            | Self::RoleForbidden { .. }
            | Self::CompanyMismatch => 403,

            Self::DocumentNotFound(_) | Self::TokenInvalid => 404,

            Self::InvalidTransition { .. }
            | Self::NotEditable { .. }
            | Self::CanOnlyDeleteDraft
            | Self::TokenConsumed
            | Self::TokenExpired => 409,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotEditable { .. } => "NOT_EDITABLE",
            Self::CanOnlyDeleteDraft => "CAN_ONLY_DELETE_DRAFT",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::NotDocumentIssuer => "NOT_DOCUMENT_ISSUER",
            Self::NotCounterParty => "NOT_COUNTER_PARTY",
            Self::RoleForbidden { .. } => "ROLE_FORBIDDEN",
            Self::CompanyMismatch => "COMPANY_MISMATCH",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenConsumed => "TOKEN_CONSUMED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_error() {
        let err = LifecycleError::InvalidTransition {
            from: DocumentStatus::Approved,
            to: DocumentStatus::Approved,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("approved"));
    }

    #[test]
    fn test_conflict_distinct_from_not_found() {
        // "already used" must not look like "never existed".
        assert_eq!(LifecycleError::TokenInvalid.status_code(), 404);
        assert_eq!(LifecycleError::TokenConsumed.status_code(), 409);
        assert_eq!(LifecycleError::TokenExpired.status_code(), 409);
        assert_ne!(
            LifecycleError::TokenInvalid.error_code(),
            LifecycleError::TokenConsumed.error_code()
        );
    }

    #[test]
    fn test_authorization_errors_are_403() {
        assert_eq!(LifecycleError::NotDocumentIssuer.status_code(), 403);
        assert_eq!(LifecycleError::NotCounterParty.status_code(), 403);
        assert_eq!(LifecycleError::CompanyMismatch.status_code(), 403);
        assert_eq!(
            LifecycleError::RoleForbidden {
                role: Role::CounterParty
            }
            .status_code(),
            403
        );
    }

    #[test]
    fn test_reason_required_is_400() {
        assert_eq!(LifecycleError::RejectionReasonRequired.status_code(), 400);
        assert_eq!(
            LifecycleError::RejectionReasonRequired.error_code(),
            "REJECTION_REASON_REQUIRED"
        );
    }
}
