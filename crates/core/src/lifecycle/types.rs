//! Lifecycle domain types for reconciliation documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Document status in the reconciliation lifecycle.
///
/// Documents progress strictly forward. The valid transitions are:
/// - Draft → Sent (dispatch to the counter-party)
/// - Sent → Approved (counter-party accepts)
/// - Sent → Rejected (counter-party disputes)
///
/// No transition re-enters Draft; Approved and Rejected are terminal.
/// Draft documents may also be hard-deleted by their issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Document is being drafted and can be modified by its issuer.
    Draft,
    /// Document has been dispatched and awaits the counter-party.
    Sent,
    /// Counter-party accepted the reconciliation (terminal).
    Approved,
    /// Counter-party disputed the reconciliation (terminal).
    Rejected,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the document can still be modified in place.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the document has reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller role used by the tenant/role guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May act on any tenant's documents.
    SystemAdmin,
    /// May act within its own company only.
    CompanyAdmin,
    /// Accounting staff; may dispatch documents within its own company.
    Accounting,
    /// Planning staff; may dispatch documents within its own company.
    Planning,
    /// Ordinary counter-party; may act only on documents naming it.
    CounterParty,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemAdmin => "system_admin",
            Self::CompanyAdmin => "company_admin",
            Self::Accounting => "accounting",
            Self::Planning => "planning",
            Self::CounterParty => "counter_party",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "system_admin" => Some(Self::SystemAdmin),
            "company_admin" => Some(Self::CompanyAdmin),
            "accounting" => Some(Self::Accounting),
            "planning" => Some(Self::Planning),
            "counter_party" => Some(Self::CounterParty),
            _ => None,
        }
    }

    /// Returns true for staff roles that may dispatch documents belonging to
    /// their own company.
    #[must_use]
    pub fn can_dispatch(&self) -> bool {
        matches!(
            self,
            Self::SystemAdmin | Self::CompanyAdmin | Self::Accounting | Self::Planning
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated caller, as seen by the guard.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// Caller's user id.
    pub user_id: Uuid,
    /// Caller's company id.
    pub company_id: Uuid,
    /// Caller's role.
    pub role: Role,
}

/// Lifecycle action representing a validated state transition with audit data.
///
/// Each variant captures the action performed, the resulting status, and the
/// side-effect payload the persistence layer must apply atomically.
#[derive(Debug, Clone)]
pub enum LifecycleAction {
    /// Dispatch a draft document to its counter-party.
    Send {
        /// The new status after dispatch.
        new_status: DocumentStatus,
        /// Freshly issued approval token; overwrites any prior token.
        token: String,
        /// When the token stops verifying.
        token_expires_at: DateTime<Utc>,
        /// The user who dispatched the document.
        sent_by: Uuid,
        /// When the document was dispatched.
        sent_at: DateTime<Utc>,
    },
    /// Counter-party accepts a sent document.
    Approve {
        /// The new status after approval.
        new_status: DocumentStatus,
        /// When the document was approved.
        approved_at: DateTime<Utc>,
    },
    /// Counter-party disputes a sent document.
    Reject {
        /// The new status after rejection.
        new_status: DocumentStatus,
        /// The reason for rejection (required, non-empty).
        rejection_reason: String,
        /// Whether the counter-party asked for a detailed statement.
        statement_requested: bool,
        /// When the document was rejected.
        rejected_at: DateTime<Utc>,
    },
}

impl LifecycleAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> DocumentStatus {
        match self {
            Self::Send { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. } => *new_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(DocumentStatus::Draft.as_str(), "draft");
        assert_eq!(DocumentStatus::Sent.as_str(), "sent");
        assert_eq!(DocumentStatus::Approved.as_str(), "approved");
        assert_eq!(DocumentStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(DocumentStatus::parse("draft"), Some(DocumentStatus::Draft));
        assert_eq!(DocumentStatus::parse("SENT"), Some(DocumentStatus::Sent));
        assert_eq!(
            DocumentStatus::parse("Approved"),
            Some(DocumentStatus::Approved)
        );
        assert_eq!(DocumentStatus::parse("cancelled"), None);
        assert_eq!(DocumentStatus::parse("invalid"), None);
    }

    #[test]
    fn test_status_editable() {
        assert!(DocumentStatus::Draft.is_editable());
        assert!(!DocumentStatus::Sent.is_editable());
        assert!(!DocumentStatus::Approved.is_editable());
        assert!(!DocumentStatus::Rejected.is_editable());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!DocumentStatus::Draft.is_terminal());
        assert!(!DocumentStatus::Sent.is_terminal());
        assert!(DocumentStatus::Approved.is_terminal());
        assert!(DocumentStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [
            Role::SystemAdmin,
            Role::CompanyAdmin,
            Role::Accounting,
            Role::Planning,
            Role::CounterParty,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("viewer"), None);
    }

    #[test]
    fn test_role_dispatch_rights() {
        assert!(Role::SystemAdmin.can_dispatch());
        assert!(Role::CompanyAdmin.can_dispatch());
        assert!(Role::Accounting.can_dispatch());
        assert!(Role::Planning.can_dispatch());
        assert!(!Role::CounterParty.can_dispatch());
    }
}
