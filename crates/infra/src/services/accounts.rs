//! Self-service registration and login.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use medrx_auth::{PasswordHash, password};
use medrx_core::{DomainError, DomainResult};
use medrx_people::{NewPerson, Person, Profile, RegistrationRequest, approved_on_creation};

use crate::directory::{EntityDirectory, NewAccount};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub struct AccountService {
    directory: Arc<dyn EntityDirectory>,
}

impl AccountService {
    pub fn new(directory: Arc<dyn EntityDirectory>) -> Self {
        Self { directory }
    }

    /// Register a doctor, pharmacist or patient.
    pub fn register(&self, request: &RegistrationRequest, today: NaiveDate) -> DomainResult<Person> {
        let new = request.validate_self_service(today).inspect_err(|e| {
            tracing::warn!(username = ?request.username, error = %e, "registration rejected");
        })?;

        let account = hash_account(new)?;
        let person = self.directory.insert_person(account).inspect_err(|e| {
            tracing::warn!(error = %e, "registration rejected by directory");
        })?;

        tracing::info!(
            person_id = %person.id,
            username = %person.username,
            role = %person.role(),
            approved = person.approved,
            "account registered"
        );
        Ok(person)
    }

    /// Verify credentials; only approved accounts get through.
    pub fn login(&self, request: &LoginRequest) -> DomainResult<Person> {
        let username = non_empty(request.username.as_deref())
            .ok_or_else(|| DomainError::validation("Username is required."))?;
        let password = request
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DomainError::validation("Password is required."))?;

        let person = self.directory.find_person_by_username(username)?;
        let stored = match &person {
            Some(p) => Some(
                p.password_hash
                    .parse::<PasswordHash>()
                    .map_err(|e| DomainError::internal(e.to_string()))?,
            ),
            None => None,
        };

        if !password::verify(password, stored.as_ref()) {
            tracing::warn!(%username, "login failed: bad credentials");
            return Err(DomainError::unauthorized("Invalid username or password."));
        }
        let Some(person) = person else {
            return Err(DomainError::unauthorized("Invalid username or password."));
        };

        if !person.can_authenticate() {
            tracing::warn!(%username, "login refused: account not approved");
            return Err(DomainError::forbidden("Your account is not approved yet!"));
        }

        tracing::info!(%username, role = %person.role(), "login succeeded");
        Ok(person)
    }
}

/// Success message shown after self-service registration.
pub fn registration_message(person: &Person) -> &'static str {
    match person.profile {
        Profile::Doctor { .. } => "Doctor registered successfully! Awaiting admin approval.",
        Profile::Pharmacist { .. } => "Pharmacist registered successfully! Awaiting admin approval.",
        Profile::Patient { .. } => "Patient registered successfully!",
        Profile::Admin { .. } => "New admin succesfully registered.",
    }
}

/// Hash the password and set the initial approval flag.
pub(crate) fn hash_account(new: NewPerson) -> DomainResult<NewAccount> {
    let hash = password::hash(&new.password).map_err(|e| DomainError::internal(e.to_string()))?;
    Ok(NewAccount {
        approved: approved_on_creation(&new.profile),
        username: new.username,
        password_hash: hash.as_str().to_string(),
        first_name: new.first_name,
        last_name: new.last_name,
        email: new.email,
        phone: new.phone,
        profile: new.profile,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::directory::InMemoryDirectory;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn service() -> AccountService {
        AccountService::new(Arc::new(InMemoryDirectory::new()))
    }

    fn doctor_body(username: &str) -> RegistrationRequest {
        serde_json::from_value(json!({
            "username": username,
            "password": "Secret1!",
            "firstName": "Greg",
            "lastName": "House",
            "email": format!("{username}@example.com"),
            "phone": "01234567890",
            "personType": "DOCTOR",
            "officeName": "Princeton",
        }))
        .unwrap()
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn password_is_stored_hashed() {
        let svc = service();
        let p = svc.register(&doctor_body("doc1"), today()).unwrap();
        assert_ne!(p.password_hash, "Secret1!");
        assert!(p.password_hash.starts_with("$argon2"));
        assert_eq!(registration_message(&p), "Doctor registered successfully! Awaiting admin approval.");
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let svc = service();
        svc.register(&doctor_body("doc1"), today()).unwrap();
        let mut again = doctor_body("doc1");
        again.email = Some("other@example.com".into());
        assert_eq!(
            svc.register(&again, today()),
            Err(DomainError::conflict("Username already exists. Please choose another."))
        );
    }

    #[test]
    fn unapproved_doctor_cannot_log_in() {
        let svc = service();
        svc.register(&doctor_body("doc1"), today()).unwrap();
        assert_eq!(
            svc.login(&login("doc1", "Secret1!")),
            Err(DomainError::forbidden("Your account is not approved yet!"))
        );
    }

    #[test]
    fn bad_credentials_are_unauthorized() {
        let svc = service();
        svc.register(&doctor_body("doc1"), today()).unwrap();
        assert!(matches!(svc.login(&login("doc1", "Wrong1!!")), Err(DomainError::Unauthorized(_))));
        assert!(matches!(svc.login(&login("ghost", "Secret1!")), Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn login_requires_both_fields() {
        let svc = service();
        assert_eq!(
            svc.login(&LoginRequest::default()),
            Err(DomainError::validation("Username is required."))
        );
    }
}
