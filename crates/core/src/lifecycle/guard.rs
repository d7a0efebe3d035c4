//! Role- and tenant-scoped authorization for document actions.
//!
//! Guard policy:
//! - a system admin may act on any company's documents;
//! - company admin / accounting / planning roles act only within their own
//!   company;
//! - an ordinary counter-party acts only on documents naming it, regardless
//!   of company;
//! - Draft-only edits and deletes belong to the original issuer alone.
//!
//! Every check runs before any state is touched.

use uuid::Uuid;

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::types::{Actor, Role};

/// Identity fields of a document, as the guard needs them.
#[derive(Debug, Clone, Copy)]
pub struct DocumentRef {
    /// Company (tenant) the document belongs to — the counter-party's.
    pub company_id: Uuid,
    /// The issuing user.
    pub issuer_id: Uuid,
    /// The named counter-party user.
    pub counter_party_id: Uuid,
}

/// Authorizes the Draft → Sent dispatch.
///
/// The issuer may always dispatch their own draft; otherwise a staff role
/// with dispatch rights may do so for documents of its own company, and a
/// system admin for any company.
///
/// # Errors
///
/// Returns `RoleForbidden` or `CompanyMismatch` before any state changes.
pub fn authorize_send(actor: &Actor, document: &DocumentRef) -> Result<(), LifecycleError> {
    if actor.user_id == document.issuer_id {
        return Ok(());
    }
    if !actor.role.can_dispatch() {
        return Err(LifecycleError::RoleForbidden { role: actor.role });
    }
    if actor.role == Role::SystemAdmin || actor.company_id == document.company_id {
        Ok(())
    } else {
        Err(LifecycleError::CompanyMismatch)
    }
}

/// Authorizes approve/reject: only the named counter-party, regardless of
/// which company the actor belongs to.
///
/// # Errors
///
/// Returns `NotCounterParty` when the actor is not the named counter-party.
pub fn authorize_counter_party(
    actor: &Actor,
    document: &DocumentRef,
) -> Result<(), LifecycleError> {
    if actor.user_id == document.counter_party_id {
        Ok(())
    } else {
        Err(LifecycleError::NotCounterParty)
    }
}

/// Authorizes Draft-only in-place edits: the original issuer alone.
///
/// # Errors
///
/// Returns `NotDocumentIssuer` when the actor did not issue the document.
pub fn authorize_edit(actor: &Actor, document: &DocumentRef) -> Result<(), LifecycleError> {
    if actor.user_id == document.issuer_id {
        Ok(())
    } else {
        Err(LifecycleError::NotDocumentIssuer)
    }
}

/// Authorizes hard deletion: the original issuer alone.
///
/// # Errors
///
/// Returns `NotDocumentIssuer` when the actor did not issue the document.
pub fn authorize_delete(actor: &Actor, document: &DocumentRef) -> Result<(), LifecycleError> {
    authorize_edit(actor, document)
}

/// Authorizes a read: issuer, named counter-party, staff of the document's
/// company, or a system admin.
///
/// # Errors
///
/// Returns `CompanyMismatch` when the actor has no relationship to the
/// document.
pub fn authorize_read(actor: &Actor, document: &DocumentRef) -> Result<(), LifecycleError> {
    if actor.user_id == document.issuer_id
        || actor.user_id == document.counter_party_id
        || actor.role == Role::SystemAdmin
        || (actor.role.can_dispatch() && actor.company_id == document.company_id)
    {
        Ok(())
    } else {
        Err(LifecycleError::CompanyMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            role,
        }
    }

    fn document() -> DocumentRef {
        DocumentRef {
            company_id: Uuid::new_v4(),
            issuer_id: Uuid::new_v4(),
            counter_party_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_issuer_can_send_regardless_of_role() {
        let doc = document();
        let issuer = Actor {
            user_id: doc.issuer_id,
            company_id: Uuid::new_v4(),
            role: Role::CounterParty,
        };
        assert!(authorize_send(&issuer, &doc).is_ok());
    }

    #[test]
    fn test_system_admin_sends_across_companies() {
        let doc = document();
        assert!(authorize_send(&actor(Role::SystemAdmin), &doc).is_ok());
    }

    #[test]
    fn test_staff_sends_only_within_company() {
        let doc = document();
        for role in [Role::CompanyAdmin, Role::Accounting, Role::Planning] {
            let mut staff = actor(role);
            assert!(matches!(
                authorize_send(&staff, &doc),
                Err(LifecycleError::CompanyMismatch)
            ));

            staff.company_id = doc.company_id;
            assert!(authorize_send(&staff, &doc).is_ok());
        }
    }

    #[test]
    fn test_counter_party_role_cannot_send_others_documents() {
        let doc = document();
        assert!(matches!(
            authorize_send(&actor(Role::CounterParty), &doc),
            Err(LifecycleError::RoleForbidden { .. })
        ));
    }

    #[test]
    fn test_only_named_counter_party_approves() {
        let doc = document();
        let named = Actor {
            user_id: doc.counter_party_id,
            company_id: Uuid::new_v4(), // company never matters here
            role: Role::CounterParty,
        };
        assert!(authorize_counter_party(&named, &doc).is_ok());

        // Even a system admin is not the counter-party.
        assert!(matches!(
            authorize_counter_party(&actor(Role::SystemAdmin), &doc),
            Err(LifecycleError::NotCounterParty)
        ));
    }

    #[test]
    fn test_only_issuer_edits_and_deletes() {
        let doc = document();
        let issuer = Actor {
            user_id: doc.issuer_id,
            company_id: doc.company_id,
            role: Role::Accounting,
        };
        assert!(authorize_edit(&issuer, &doc).is_ok());
        assert!(authorize_delete(&issuer, &doc).is_ok());

        assert!(matches!(
            authorize_edit(&actor(Role::CompanyAdmin), &doc),
            Err(LifecycleError::NotDocumentIssuer)
        ));
        assert!(matches!(
            authorize_delete(&actor(Role::SystemAdmin), &doc),
            Err(LifecycleError::NotDocumentIssuer)
        ));
    }

    #[test]
    fn test_read_scope() {
        let doc = document();

        let named = Actor {
            user_id: doc.counter_party_id,
            company_id: Uuid::new_v4(),
            role: Role::CounterParty,
        };
        assert!(authorize_read(&named, &doc).is_ok());
        assert!(authorize_read(&actor(Role::SystemAdmin), &doc).is_ok());

        let staff_same_company = Actor {
            user_id: Uuid::new_v4(),
            company_id: doc.company_id,
            role: Role::Accounting,
        };
        assert!(authorize_read(&staff_same_company, &doc).is_ok());

        // Unrelated counter-party from another company sees nothing.
        assert!(authorize_read(&actor(Role::CounterParty), &doc).is_err());
    }
}
