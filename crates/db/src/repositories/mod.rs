//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

pub mod approval_token;
pub mod company;
pub mod consolidation;
pub mod document;
pub mod lifecycle;
pub mod subaccount;
pub mod user;

pub use approval_token::ApprovalTokenRepository;
pub use company::CompanyRepository;
pub use consolidation::{
    BatchResult, ConsolidationError, ConsolidationRepository, ConsolidationSettings,
    CreatedDocument, RowFailure,
};
pub use document::{
    CreateDocumentInput, DocumentError, DocumentFilter, DocumentRepository, UpdateDraftInput,
};
pub use lifecycle::LifecycleRepository;
pub use subaccount::SubAccountRepository;
pub use user::{CreateUserInput, UserRepository};
