//! Sub-account registry repository.
//!
//! Registry entries are onboarded here, ahead of any consolidation run;
//! the consolidation engine only ever updates them. This asymmetry is
//! deliberate: counter-party users are auto-provisioned during import,
//! registry entries are not.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::subaccounts;

/// Sub-account registry repository.
#[derive(Debug, Clone)]
pub struct SubAccountRepository {
    db: DatabaseConnection,
}

impl SubAccountRepository {
    /// Creates a new sub-account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Onboards a registry entry for a counter-party.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (including the uniqueness of
    /// (counter-party, code)).
    pub async fn create(
        &self,
        company_id: Uuid,
        counter_party_id: Uuid,
        code: &str,
        display_name: &str,
    ) -> Result<subaccounts::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let entry = subaccounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            counter_party_id: Set(counter_party_id),
            code: Set(code.to_string()),
            display_name: Set(display_name.to_string()),
            balance: Set(Decimal::ZERO),
            last_reconciled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        entry.insert(&self.db).await
    }

    /// Lists a counter-party's registry entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_counter_party(
        &self,
        counter_party_id: Uuid,
    ) -> Result<Vec<subaccounts::Model>, DbErr> {
        subaccounts::Entity::find()
            .filter(subaccounts::Column::CounterPartyId.eq(counter_party_id))
            .order_by_asc(subaccounts::Column::Code)
            .all(&self.db)
            .await
    }

    /// Finds one registry entry by owner and code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        counter_party_id: Uuid,
        code: &str,
    ) -> Result<Option<subaccounts::Model>, DbErr> {
        subaccounts::Entity::find()
            .filter(subaccounts::Column::CounterPartyId.eq(counter_party_id))
            .filter(subaccounts::Column::Code.eq(code))
            .one(&self.db)
            .await
    }
}
