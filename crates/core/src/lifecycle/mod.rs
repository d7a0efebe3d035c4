//! Document lifecycle: state machine, transitions, and authorization guards.
//!
//! A reconciliation document moves strictly forward through
//! Draft → Sent → Approved/Rejected. The state machine here is pure: it
//! validates a transition against the current status and returns an action
//! carrying the audit stamps; the database layer applies the action.

pub mod error;
pub mod guard;
pub mod service;
pub mod types;

pub use error::LifecycleError;
pub use guard::{
    DocumentRef, authorize_counter_party, authorize_delete, authorize_edit, authorize_read,
    authorize_send,
};
pub use service::LifecycleService;
pub use types::{Actor, DocumentStatus, LifecycleAction, Role};
