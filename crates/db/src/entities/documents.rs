//! `SeaORM` Entity for documents table.
//!
//! One reconciliation document per (taxpayer, period) group. The approval
//! token lives directly on the row as a single-use capability; overwriting
//! it on re-send implicitly revokes the previous one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::DocumentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The counter-party's company, never the issuer's own tenant when the
    /// issuer acts cross-tenant.
    pub company_id: Uuid,
    #[sea_orm(unique)]
    pub document_number: String,
    pub issuer_id: Uuid,
    pub counter_party_id: Uuid,
    pub counter_party_taxpayer_id: String,
    pub period_start: Date,
    pub period_end: Date,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub net_balance: Decimal,
    pub line_count: i32,
    pub status: DocumentStatus,
    pub note: String,
    pub rejection_reason: Option<String>,
    pub statement_requested: bool,
    pub approval_token: Option<String>,
    pub token_consumed: bool,
    pub token_consumed_at: Option<DateTimeWithTimeZone>,
    pub token_expires_at: Option<DateTimeWithTimeZone>,
    pub sent_at: Option<DateTimeWithTimeZone>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Companies,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CounterPartyId",
        to = "super::users::Column::Id"
    )]
    CounterParty,
    #[sea_orm(has_many = "super::document_lines::Entity")]
    DocumentLines,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::document_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
