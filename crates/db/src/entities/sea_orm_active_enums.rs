//! Database enum mappings.

use balanco_core::lifecycle;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role stored in the `user_role` Postgres enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// May act on any company's documents.
    #[sea_orm(string_value = "system_admin")]
    SystemAdmin,
    /// May administer its own company.
    #[sea_orm(string_value = "company_admin")]
    CompanyAdmin,
    /// Accounting staff.
    #[sea_orm(string_value = "accounting")]
    Accounting,
    /// Planning staff.
    #[sea_orm(string_value = "planning")]
    Planning,
    /// Ordinary counter-party account.
    #[sea_orm(string_value = "counter_party")]
    CounterParty,
}

impl UserRole {
    /// Maps the stored role to the core guard role.
    #[must_use]
    pub const fn as_core(&self) -> lifecycle::Role {
        match self {
            Self::SystemAdmin => lifecycle::Role::SystemAdmin,
            Self::CompanyAdmin => lifecycle::Role::CompanyAdmin,
            Self::Accounting => lifecycle::Role::Accounting,
            Self::Planning => lifecycle::Role::Planning,
            Self::CounterParty => lifecycle::Role::CounterParty,
        }
    }
}

impl From<lifecycle::Role> for UserRole {
    fn from(role: lifecycle::Role) -> Self {
        match role {
            lifecycle::Role::SystemAdmin => Self::SystemAdmin,
            lifecycle::Role::CompanyAdmin => Self::CompanyAdmin,
            lifecycle::Role::Accounting => Self::Accounting,
            lifecycle::Role::Planning => Self::Planning,
            lifecycle::Role::CounterParty => Self::CounterParty,
        }
    }
}

/// Document status stored in the `document_status` Postgres enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_status")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Editable by the issuer.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Awaiting the counter-party.
    #[sea_orm(string_value = "sent")]
    Sent,
    /// Terminal: accepted.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Terminal: disputed.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl DocumentStatus {
    /// Maps the stored status to the core state-machine status.
    #[must_use]
    pub const fn as_core(&self) -> lifecycle::DocumentStatus {
        match self {
            Self::Draft => lifecycle::DocumentStatus::Draft,
            Self::Sent => lifecycle::DocumentStatus::Sent,
            Self::Approved => lifecycle::DocumentStatus::Approved,
            Self::Rejected => lifecycle::DocumentStatus::Rejected,
        }
    }
}

impl From<lifecycle::DocumentStatus> for DocumentStatus {
    fn from(status: lifecycle::DocumentStatus) -> Self {
        match status {
            lifecycle::DocumentStatus::Draft => Self::Draft,
            lifecycle::DocumentStatus::Sent => Self::Sent,
            lifecycle::DocumentStatus::Approved => Self::Approved,
            lifecycle::DocumentStatus::Rejected => Self::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_with_core() {
        for status in [
            lifecycle::DocumentStatus::Draft,
            lifecycle::DocumentStatus::Sent,
            lifecycle::DocumentStatus::Approved,
            lifecycle::DocumentStatus::Rejected,
        ] {
            assert_eq!(DocumentStatus::from(status).as_core(), status);
        }
    }

    #[test]
    fn test_role_roundtrip_with_core() {
        for role in [
            lifecycle::Role::SystemAdmin,
            lifecycle::Role::CompanyAdmin,
            lifecycle::Role::Accounting,
            lifecycle::Role::Planning,
            lifecycle::Role::CounterParty,
        ] {
            assert_eq!(UserRole::from(role).as_core(), role);
        }
    }
}
