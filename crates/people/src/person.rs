//! Account records: one shared base plus a closed set of profiles.

use chrono::NaiveDate;
use serde::Serialize;

use medrx_auth::Role;
use medrx_core::{PersonId, Sentinel};

// ─────────────────────────────────────────────────────────────────────────────
// Wire enums
// ─────────────────────────────────────────────────────────────────────────────

/// Account kind as sent by clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonType {
    Doctor,
    Pharmacist,
    Patient,
    SuperAdmin,
    Moderator,
    None,
}

impl Sentinel for PersonType {
    const SENTINEL: Self = PersonType::None;
    const VARIANTS: &'static [Self] = &[
        PersonType::Doctor,
        PersonType::Pharmacist,
        PersonType::Patient,
        PersonType::SuperAdmin,
        PersonType::Moderator,
    ];

    fn name(self) -> &'static str {
        match self {
            PersonType::Doctor => "DOCTOR",
            PersonType::Pharmacist => "PHARMACIST",
            PersonType::Patient => "PATIENT",
            PersonType::SuperAdmin => "SUPER_ADMIN",
            PersonType::Moderator => "MODERATOR",
            PersonType::None => "NONE",
        }
    }
}

impl PersonType {
    pub fn is_admin(self) -> bool {
        matches!(self, PersonType::SuperAdmin | PersonType::Moderator)
    }
}

/// Admin tier as sent by clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminLevel {
    SuperAdmin,
    Moderator,
    None,
}

impl Sentinel for AdminLevel {
    const SENTINEL: Self = AdminLevel::None;
    const VARIANTS: &'static [Self] = &[AdminLevel::SuperAdmin, AdminLevel::Moderator];

    fn name(self) -> &'static str {
        match self {
            AdminLevel::SuperAdmin => "SUPER_ADMIN",
            AdminLevel::Moderator => "MODERATOR",
            AdminLevel::None => "NONE",
        }
    }
}

impl AdminLevel {
    /// Role granted to an admin at this level; `None` for the sentinel.
    pub fn role(self) -> Option<Role> {
        match self {
            AdminLevel::SuperAdmin => Some(Role::SuperAdmin),
            AdminLevel::Moderator => Some(Role::Moderator),
            AdminLevel::None => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Person
// ─────────────────────────────────────────────────────────────────────────────

/// Postal address owned by a patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Kind-specific data of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "personType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Profile {
    #[serde(rename_all = "camelCase")]
    Doctor { office_name: String },

    #[serde(rename_all = "camelCase")]
    Pharmacist {
        pharmacy_name: String,
        pharmacy_code: String,
    },

    #[serde(rename_all = "camelCase")]
    Patient {
        address: Address,
        birthday: NaiveDate,
        patient_insurance_number: String,
    },

    /// `admin_level` is always [`Role::SuperAdmin`] or [`Role::Moderator`].
    #[serde(rename_all = "camelCase")]
    Admin { admin_level: Role },
}

/// A registered account.
///
/// # Invariants
/// - `username` and `email` are unique across all accounts.
/// - Only an approved account can authenticate.
/// - Patients and admins are approved at creation; doctors and pharmacists are not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub approved: bool,
    #[serde(flatten)]
    pub profile: Profile,
}

impl Person {
    pub fn role(&self) -> Role {
        match &self.profile {
            Profile::Doctor { .. } => Role::Doctor,
            Profile::Pharmacist { .. } => Role::Pharmacist,
            Profile::Patient { .. } => Role::Patient,
            Profile::Admin { admin_level } => *admin_level,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.profile, Profile::Admin { .. })
    }

    pub fn can_authenticate(&self) -> bool {
        self.approved
    }

    pub fn pharmacy_code(&self) -> Option<&str> {
        match &self.profile {
            Profile::Pharmacist { pharmacy_code, .. } => Some(pharmacy_code),
            _ => None,
        }
    }

    pub fn insurance_number(&self) -> Option<&str> {
        match &self.profile {
            Profile::Patient {
                patient_insurance_number,
                ..
            } => Some(patient_insurance_number),
            _ => None,
        }
    }
}

/// Whether a freshly created account of this profile starts approved.
pub fn approved_on_creation(profile: &Profile) -> bool {
    matches!(profile, Profile::Patient { .. } | Profile::Admin { .. })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn person(id: u64, username: &str, profile: Profile) -> Person {
        Person {
            id: PersonId::new(id),
            username: username.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            email: format!("{username}@example.com"),
            phone: "+4915112345678".to_string(),
            approved: approved_on_creation(&profile),
            profile,
        }
    }

    pub fn doctor(id: u64, username: &str) -> Person {
        person(
            id,
            username,
            Profile::Doctor {
                office_name: "Praxis Mitte".to_string(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use medrx_core::parse_or_sentinel;

    use super::fixtures::*;
    use super::*;

    #[test]
    fn role_follows_profile() {
        assert_eq!(doctor(1, "doc1").role(), Role::Doctor);
        let admin = person(2, "root", Profile::Admin { admin_level: Role::SuperAdmin });
        assert_eq!(admin.role(), Role::SuperAdmin);
        assert!(admin.is_admin());
    }

    #[test]
    fn default_approval_per_profile() {
        assert!(!doctor(1, "doc1").approved);
        let pharmacist = person(
            2,
            "pharma",
            Profile::Pharmacist {
                pharmacy_name: "Apotheke".into(),
                pharmacy_code: "PHARMA0001".into(),
            },
        );
        assert!(!pharmacist.approved);
        assert_eq!(pharmacist.pharmacy_code(), Some("PHARMA0001"));
    }

    #[test]
    fn admin_level_sentinel() {
        assert_eq!(parse_or_sentinel::<AdminLevel>("super_admin"), AdminLevel::SuperAdmin);
        assert_eq!(parse_or_sentinel::<AdminLevel>("root"), AdminLevel::None);
        assert_eq!(AdminLevel::None.role(), None);
    }

    #[test]
    fn serialization_hides_password_and_tags_profile() {
        let json = serde_json::to_value(doctor(1, "doc1")).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["personType"], "DOCTOR");
        assert_eq!(json["officeName"], "Praxis Mitte");
        assert_eq!(json["approved"], false);
    }
}
