//! Admin tier: bootstrap-guarded admin registration, approval, deletion.

use std::sync::Arc;

use medrx_auth::{Principal, Role, can_register_admin};
use medrx_core::{DomainError, DomainResult, PersonId};
use medrx_people::{AdminLevel, ApprovalOutcome, Person, RegistrationRequest};

use crate::directory::{DirectoryError, EntityDirectory};
use crate::services::accounts::hash_account;

const ONLY_SUPER_ADMIN: &str = "Only a SUPER_ADMIN can register new admins.";
const ONLY_SUPER_ADMIN_DELETES: &str = "Only a SUPER_ADMIN can delete a SUPER_ADMIN.";

pub struct AdminService {
    directory: Arc<dyn EntityDirectory>,
}

impl AdminService {
    pub fn new(directory: Arc<dyn EntityDirectory>) -> Self {
        Self { directory }
    }

    /// Whether `actor` may create an admin at `level` right now.
    ///
    /// Until the first admin has been created any caller qualifies and the
    /// requested level is accepted as given. Deleting admins never reopens this.
    pub fn can_register_admin(&self, actor: Option<&Principal>, level: AdminLevel) -> DomainResult<bool> {
        let bootstrapped = self.directory.admin_ever_created()?;
        let allowed = can_register_admin(actor, bootstrapped);
        tracing::debug!(?level, bootstrapped, allowed, "admin registration check");
        Ok(allowed)
    }

    /// Create an admin. The bootstrap decision is re-evaluated atomically with
    /// the insert, so two concurrent bootstrap requests cannot both succeed.
    pub fn register_admin(
        &self,
        actor: Option<&Principal>,
        request: &RegistrationRequest,
    ) -> DomainResult<Person> {
        let level = request.admin_level.unwrap_or(AdminLevel::None);
        if !self.can_register_admin(actor, level)? {
            tracing::warn!(actor = ?actor.map(|a| &a.username), "admin registration refused");
            return Err(DomainError::forbidden(ONLY_SUPER_ADMIN));
        }

        let new = request.validate_admin()?;
        let account = hash_account(new)?;

        let guard = |bootstrapped: bool| can_register_admin(actor, bootstrapped);
        let admin = self
            .directory
            .insert_admin(account, &guard)
            .map_err(|e| match e {
                DirectoryError::Rejected(_) => DomainError::forbidden(ONLY_SUPER_ADMIN),
                other => other.into(),
            })?;

        tracing::info!(
            person_id = %admin.id,
            username = %admin.username,
            level = %admin.role(),
            by = ?actor.map(|a| &a.username),
            "admin registered"
        );
        Ok(admin)
    }

    pub fn approve(&self, username: &str) -> DomainResult<(Person, ApprovalOutcome)> {
        let (person, outcome) = self.directory.approve_person(username)?;
        tracing::info!(%username, ?outcome, "approval processed");
        Ok((person, outcome))
    }

    /// Delete an admin account on behalf of `actor`.
    ///
    /// A MODERATOR may only remove moderators; the last SUPER_ADMIN is never
    /// removed.
    pub fn delete_admin(&self, actor: &Principal, id: PersonId) -> DomainResult<Person> {
        let target = self
            .directory
            .find_person(id)?
            .filter(Person::is_admin)
            .ok_or_else(|| DomainError::not_found(format!("Admin with ID {id} not found.")))?;

        if target.role() == Role::SuperAdmin && !actor.has_role(Role::SuperAdmin) {
            tracing::warn!(actor = %actor.username, target = %target.username, "admin deletion refused");
            return Err(DomainError::forbidden(ONLY_SUPER_ADMIN_DELETES));
        }

        let removed = self.directory.delete_admin(id)?;
        tracing::info!(
            person_id = %id,
            username = %removed.username,
            by = %actor.username,
            "admin deleted"
        );
        Ok(removed)
    }
}
