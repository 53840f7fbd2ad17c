//! `medrx-people`: accounts: doctors, pharmacists, patients and admins.

pub mod approval;
pub mod person;
pub mod registration;
pub mod validation;

pub use approval::ApprovalOutcome;
pub use person::{Address, AdminLevel, Person, PersonType, Profile, approved_on_creation};
pub use registration::{AddressRequest, NewPerson, RegistrationRequest};
