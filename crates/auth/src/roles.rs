use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role carried by an authenticated principal.
///
/// The set is closed: every account kind maps to exactly one role, and policy
/// decisions match on it exhaustively.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Doctor,
    Pharmacist,
    Patient,
    SuperAdmin,
    Moderator,
}

/// Prefix used for role authorities inside tokens (`ROLE_DOCTOR`).
pub const AUTHORITY_PREFIX: &str = "ROLE_";

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Doctor,
        Role::Pharmacist,
        Role::Patient,
        Role::SuperAdmin,
        Role::Moderator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Doctor => "DOCTOR",
            Role::Pharmacist => "PHARMACIST",
            Role::Patient => "PATIENT",
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Moderator => "MODERATOR",
        }
    }

    /// Authority string as written into token claims.
    pub fn authority(self) -> String {
        format!("{AUTHORITY_PREFIX}{}", self.as_str())
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Moderator)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts `DOCTOR`, `doctor` and `ROLE_DOCTOR` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let bare = upper.strip_prefix(AUTHORITY_PREFIX).unwrap_or(&upper);
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == bare)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
