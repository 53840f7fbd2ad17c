//! Registration input: decoding, per-field validation and profile construction.

use chrono::NaiveDate;
use serde::Deserialize;

use medrx_core::{DomainError, DomainResult, allowed_values, deserialize_or_sentinel};

use crate::person::{Address, AdminLevel, PersonType, Profile};
use crate::validation::{
    is_valid_email, is_valid_insurance_number, is_valid_password, is_valid_phone,
    is_valid_username, is_valid_zip_code, non_blank,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// Registration body shared by self-service and admin registration.
///
/// Every field is optional at the decoding stage so that missing values are
/// reported together, per field, instead of failing the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_or_sentinel")]
    pub person_type: Option<PersonType>,
    pub office_name: Option<String>,
    pub pharmacy_name: Option<String>,
    pub pharmacy_code: Option<String>,
    pub address: Option<AddressRequest>,
    /// ISO date (`YYYY-MM-DD`).
    pub birthday: Option<String>,
    pub patient_insurance_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_or_sentinel")]
    pub admin_level: Option<AdminLevel>,
}

/// A validated account, ready to be hashed and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub username: String,
    /// Cleartext; hashed by the account service before storage.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub profile: Profile,
}

/// Per-field error collector.
#[derive(Default)]
struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    fn required<'a>(&mut self, field: &'static str, label: &str, value: Option<&'a str>) -> Option<&'a str> {
        let v = non_blank(value);
        if v.is_none() {
            self.push(field, format!("{label} is required"));
        }
        v
    }

    fn finish(self) -> DomainResult<()> {
        DomainError::check_fields(self.0)
    }
}

impl RegistrationRequest {
    /// Validate a self-service registration (doctor, pharmacist or patient).
    pub fn validate_self_service(&self, today: NaiveDate) -> DomainResult<NewPerson> {
        match self.person_type {
            Some(t) if t.is_admin() => {
                return Err(DomainError::validation("Admins cannot register here."));
            }
            Some(PersonType::None) => {
                return Err(DomainError::validation(
                    "Invalid person type. Choose one between DOCTOR, PHARMACIST, or PATIENT.",
                ));
            }
            _ => {}
        }

        let mut errors = FieldErrors::default();
        let base = self.base_fields(&mut errors);
        let profile = match self.person_type {
            Some(PersonType::Doctor) => self.doctor_profile(&mut errors),
            Some(PersonType::Pharmacist) => self.pharmacist_profile(&mut errors),
            Some(PersonType::Patient) => self.patient_profile(today, &mut errors),
            _ => {
                errors.push("personType", "PersonType is required");
                None
            }
        };
        errors.finish()?;
        assemble(base, profile)
    }

    /// Validate an admin registration (SUPER_ADMIN or MODERATOR).
    pub fn validate_admin(&self) -> DomainResult<NewPerson> {
        match self.person_type {
            None => {}
            Some(PersonType::None) => return Err(DomainError::validation("Person type not supported")),
            Some(t) if !t.is_admin() => {
                return Err(DomainError::validation(
                    "Only SUPER_ADMIN or MODERATOR accounts can be registered here.",
                ));
            }
            Some(_) => {}
        }

        let mut errors = FieldErrors::default();
        let base = self.base_fields(&mut errors);
        if self.person_type.is_none() {
            errors.push("personType", "PersonType is required");
        }
        let level = match self.admin_level.and_then(AdminLevel::role) {
            Some(role) => Some(role),
            None => {
                errors.push(
                    "adminLevel",
                    format!(
                        "Admin level is required, allowed values: {}",
                        allowed_values::<AdminLevel>()
                    ),
                );
                None
            }
        };
        errors.finish()?;
        assemble(base, level.map(|admin_level| Profile::Admin { admin_level }))
    }

    fn base_fields(&self, errors: &mut FieldErrors) -> Option<BaseFields> {
        let username = errors.required("username", "Username", self.username.as_deref());
        if let Some(u) = username {
            if !is_valid_username(u) {
                errors.push("username", "Username must be 4-20 characters long");
            }
        }

        // Passwords are not trimmed; surrounding whitespace fails the policy.
        let password = errors.required("password", "Password", self.password.as_deref());
        if password.is_some() && !self.password.as_deref().is_some_and(is_valid_password) {
            errors.push(
                "password",
                "Password is invalid. Password should contain at least 8 characters, \
                 have at least an uppercase letter, a digit and one special character.",
            );
        }

        let first_name = errors.required("firstName", "First name", self.first_name.as_deref());
        let last_name = errors.required("lastName", "Last name", self.last_name.as_deref());

        let email = errors.required("email", "Email", self.email.as_deref());
        if let Some(e) = email {
            if !is_valid_email(e) {
                errors.push("email", "Invalid email format");
            }
        }

        let phone = errors.required("phone", "Phone", self.phone.as_deref());
        if let Some(p) = phone {
            if !is_valid_phone(p) {
                errors.push("phone", "Phone must be 10-15 digits, optionally prefixed with +");
            }
        }

        Some(BaseFields {
            username: username?.to_string(),
            password: self.password.clone()?,
            first_name: first_name?.to_string(),
            last_name: last_name?.to_string(),
            email: email?.to_string(),
            phone: phone?.to_string(),
        })
    }

    fn doctor_profile(&self, errors: &mut FieldErrors) -> Option<Profile> {
        let office_name = errors.required("officeName", "Office name", self.office_name.as_deref())?;
        Some(Profile::Doctor {
            office_name: office_name.to_string(),
        })
    }

    fn pharmacist_profile(&self, errors: &mut FieldErrors) -> Option<Profile> {
        let name = errors.required("pharmacyName", "Pharmacy name", self.pharmacy_name.as_deref());
        let code = errors.required("pharmacyCode", "Pharmacy code", self.pharmacy_code.as_deref());
        Some(Profile::Pharmacist {
            pharmacy_name: name?.to_string(),
            pharmacy_code: code?.to_string(),
        })
    }

    fn patient_profile(&self, today: NaiveDate, errors: &mut FieldErrors) -> Option<Profile> {
        let address = match &self.address {
            Some(a) => address(a, errors),
            None => {
                errors.push("address", "Address is required for person type PATIENT");
                None
            }
        };

        let birthday = match non_blank(self.birthday.as_deref()) {
            None => {
                errors.push("birthday", "Birthday is required for person type PATIENT");
                None
            }
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Err(_) => {
                    errors.push("birthday", "Birthday must be a date in YYYY-MM-DD format");
                    None
                }
                Ok(d) if d >= today => {
                    errors.push("birthday", "Birthday must be in the past");
                    None
                }
                Ok(d) => Some(d),
            },
        };

        let insurance = errors.required(
            "patientInsuranceNumber",
            "Patient insurance number",
            self.patient_insurance_number.as_deref(),
        );
        if let Some(n) = insurance {
            if !is_valid_insurance_number(n) {
                errors.push(
                    "patientInsuranceNumber",
                    "Insurance number must be one uppercase letter followed by 9 or 11 digits",
                );
            }
        }

        Some(Profile::Patient {
            address: address?,
            birthday: birthday?,
            patient_insurance_number: insurance?.to_string(),
        })
    }
}

fn address(a: &AddressRequest, errors: &mut FieldErrors) -> Option<Address> {
    let street = errors.required("address.street", "Address street", a.street.as_deref());
    let city = errors.required("address.city", "Address city", a.city.as_deref());
    let state = errors.required("address.state", "Address state", a.state.as_deref());
    let zip = errors.required("address.zipCode", "Address zip code", a.zip_code.as_deref());
    if let Some(z) = zip {
        if !is_valid_zip_code(z) {
            errors.push("address.zipCode", "Zip code must be 5 digits");
        }
    }
    let country = errors.required("address.country", "Address country", a.country.as_deref());
    Some(Address {
        street: street?.to_string(),
        city: city?.to_string(),
        state: state?.to_string(),
        zip_code: zip?.to_string(),
        country: country?.to_string(),
    })
}

struct BaseFields {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
}

/// Only reached after `FieldErrors::finish` succeeded, so both parts are present.
fn assemble(base: Option<BaseFields>, profile: Option<Profile>) -> DomainResult<NewPerson> {
    match (base, profile) {
        (Some(b), Some(profile)) => Ok(NewPerson {
            username: b.username,
            password: b.password,
            first_name: b.first_name,
            last_name: b.last_name,
            email: b.email,
            phone: b.phone,
            profile,
        }),
        _ => Err(DomainError::validation("incomplete registration")),
    }
}
