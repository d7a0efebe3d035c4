//! `SeaORM` Entity for users table.
//!
//! Every user belongs to exactly one company; counter-party accounts carry
//! the taxpayer id they were resolved or provisioned from.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::UserRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub taxpayer_id: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub must_change_password: bool,
    pub is_active: bool,
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
    #[sea_orm(has_many = "super::subaccounts::Entity")]
    Subaccounts,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::subaccounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subaccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
