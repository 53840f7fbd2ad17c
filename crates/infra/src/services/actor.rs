//! Binds per-person routes to the authenticated caller.

use std::sync::Arc;

use medrx_auth::Principal;
use medrx_core::{DomainError, DomainResult, PersonId};

use crate::directory::EntityDirectory;

pub struct ActorBinding {
    directory: Arc<dyn EntityDirectory>,
}

impl ActorBinding {
    pub fn new(directory: Arc<dyn EntityDirectory>) -> Self {
        Self { directory }
    }

    /// Refuse when `id` names an existing account that is not the caller's.
    ///
    /// Unknown ids pass so the operation can report its own `NotFound`.
    pub fn ensure_acting_as(&self, id: PersonId, principal: &Principal) -> DomainResult<()> {
        match self.directory.find_person(id)? {
            Some(person) if person.username != principal.username => {
                tracing::warn!(
                    person_id = %id,
                    caller = %principal.username,
                    "caller acting on another account"
                );
                Err(DomainError::forbidden("You may only act on your own account."))
            }
            _ => Ok(()),
        }
    }
}
