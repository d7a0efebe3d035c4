//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Owning company.
    pub company_id: Uuid,
    /// Username, unique within the company.
    pub username: String,
    /// Optional email address.
    pub email: Option<String>,
    /// Optional phone number for SMS delivery.
    pub phone: Option<String>,
    /// Taxpayer id; required for counter-party accounts.
    pub taxpayer_id: Option<String>,
    /// Argon2 password hash.
    pub password_hash: String,
    /// Role.
    pub role: UserRole,
    /// Whether the user must rotate credentials on first login.
    pub must_change_password: bool,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user by company and username (the login identity).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(
        &self,
        company_id: Uuid,
        username: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Finds the counter-party user for a taxpayer id within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_counter_party(
        &self,
        company_id: Uuid,
        taxpayer_id: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::TaxpayerId.eq(taxpayer_id))
            .one(&self.db)
            .await
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            username: Set(input.username),
            email: Set(input.email),
            phone: Set(input.phone),
            taxpayer_id: Set(input.taxpayer_id),
            password_hash: Set(input.password_hash),
            role: Set(input.role),
            must_change_password: Set(input.must_change_password),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Replaces a user's password hash and clears the rotation flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<(), DbErr> {
        let now = chrono::Utc::now().into();

        users::ActiveModel {
            id: Set(id),
            password_hash: Set(password_hash.to_string()),
            must_change_password: Set(false),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }
}
