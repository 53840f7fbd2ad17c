use serde::Serialize;

use crate::{JwtClaims, Role};

/// A resolved, authenticated caller.
///
/// Built from verified token claims. Role strings that do not name a known role
/// are kept aside so the policy can deny them instead of ignoring them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    pub roles: Vec<Role>,
    pub unrecognized_roles: Vec<String>,
}

impl Principal {
    pub fn new(username: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            username: username.into(),
            roles,
            unrecognized_roles: Vec::new(),
        }
    }

    pub fn from_claims(claims: &JwtClaims) -> Self {
        let mut roles = Vec::new();
        let mut unrecognized_roles = Vec::new();
        for raw in &claims.roles {
            match raw.parse::<Role>() {
                Ok(role) if !roles.contains(&role) => roles.push(role),
                Ok(_) => {}
                Err(_) => unrecognized_roles.push(raw.clone()),
            }
        }
        Self {
            username: claims.sub.clone(),
            roles,
            unrecognized_roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }
}
