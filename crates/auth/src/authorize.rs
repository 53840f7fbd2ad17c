use serde::Serialize;
use thiserror::Error;

use crate::{Principal, Role};

/// Access requirement attached to a route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    /// No authentication needed.
    Public,
    /// Anyone while no admin exists, afterwards only SUPER_ADMIN.
    ///
    /// The route guard lets these requests through; the decision needs the
    /// directory and is made by the admin-registration service via
    /// [`can_register_admin`].
    BootstrapOrSuperAdmin,
    /// Caller must hold at least one of these roles.
    AnyOf(&'static [Role]),
    /// Any caller with a recognized role.
    Authenticated,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("unrecognized role '{0}'")]
    UnknownRole(String),

    #[error("forbidden: requires one of {0}")]
    Forbidden(String),
}

/// Decide whether `principal` may pass a route guarded by `access`.
///
/// - No IO
/// - No panics
/// - Unrecognized role claims deny, they never widen or narrow silently
pub fn authorize(access: Access, principal: Option<&Principal>) -> Result<(), AuthzError> {
    match access {
        Access::Public | Access::BootstrapOrSuperAdmin => Ok(()),
        Access::Authenticated => {
            let principal = authenticated(principal)?;
            if principal.roles.is_empty() {
                return Err(AuthzError::Forbidden("any role".to_string()));
            }
            Ok(())
        }
        Access::AnyOf(required) => {
            let principal = authenticated(principal)?;
            if principal.has_any_role(required) {
                Ok(())
            } else {
                Err(AuthzError::Forbidden(role_list(required)))
            }
        }
    }
}

fn authenticated(principal: Option<&Principal>) -> Result<&Principal, AuthzError> {
    let principal = principal.ok_or(AuthzError::Unauthenticated)?;
    if let Some(raw) = principal.unrecognized_roles.first() {
        return Err(AuthzError::UnknownRole(raw.clone()));
    }
    Ok(principal)
}

fn role_list(roles: &[Role]) -> String {
    roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", ")
}

/// Bootstrap rule for creating admin accounts.
///
/// The first admin ever created is trusted unconditionally, whatever level it
/// asks for. Once an admin has been created, only a SUPER_ADMIN may create
/// another, even after every admin has been deleted again.
pub fn can_register_admin(actor: Option<&Principal>, bootstrapped: bool) -> bool {
    if !bootstrapped {
        return true;
    }
    actor.is_some_and(|p| p.unrecognized_roles.is_empty() && p.has_role(Role::SuperAdmin))
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Auditable record of a route-guard decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required: String,
    pub granted: bool,
    pub reason: String,
    pub username: Option<String>,
    pub roles: Vec<String>,
}

/// Explain why a request was (or would be) allowed or denied.
pub fn explain_authorization(access: Access, principal: Option<&Principal>) -> AuthorizationExplanation {
    let required = match access {
        Access::Public => "public".to_string(),
        Access::BootstrapOrSuperAdmin => "bootstrap or SUPER_ADMIN".to_string(),
        Access::AnyOf(roles) => role_list(roles),
        Access::Authenticated => "authenticated".to_string(),
    };

    let (granted, reason) = match authorize(access, principal) {
        Ok(()) => match access {
            Access::Public => (true, "route is public".to_string()),
            Access::BootstrapOrSuperAdmin => {
                (true, "deferred to admin bootstrap check".to_string())
            }
            _ => (true, "principal holds a permitted role".to_string()),
        },
        Err(e) => (false, e.to_string()),
    };

    AuthorizationExplanation {
        required,
        granted,
        reason,
        username: principal.map(|p| p.username.clone()),
        roles: principal
            .map(|p| {
                p.roles
                    .iter()
                    .map(|r| r.as_str().to_string())
                    .chain(p.unrecognized_roles.iter().cloned())
                    .collect()
            })
            .unwrap_or_default(),
    }
}
