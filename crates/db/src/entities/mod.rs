//! `SeaORM` entity definitions.

pub mod companies;
pub mod document_lines;
pub mod documents;
pub mod sea_orm_active_enums;
pub mod subaccounts;
pub mod users;
