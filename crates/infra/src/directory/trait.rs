use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use medrx_core::{DomainError, ExpectedVersion, MedicationId, PersonId, PrescriptionId};
use medrx_people::{ApprovalOutcome, Person, Profile};
use medrx_prescriptions::{
    Medication, NewMedication, Prescription, PrescriptionStatus, PrescriptionType,
};

/// An account ready to be stored; the directory assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub approved: bool,
    pub profile: Profile,
}

impl NewAccount {
    pub fn with_id(self, id: PersonId) -> Person {
        Person {
            id,
            username: self.username,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            approved: self.approved,
            profile: self.profile,
        }
    }
}

/// A fully resolved prescription ready to be stored; the directory assigns the
/// id and the initial version, and re-checks every reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrescription {
    pub patient_id: PersonId,
    pub doctor_id: PersonId,
    pub prescription_date: NaiveDate,
    pub prescription_type: PrescriptionType,
    pub medicine: Vec<MedicationId>,
    pub qr_codes: Vec<String>,
    pub pharmacy_code: String,
}

/// Which prescriptions to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrescriptionFilter {
    All,
    Doctor(PersonId),
    Patient(PersonId),
    PharmacyCode(String),
}

impl PrescriptionFilter {
    pub fn matches(&self, p: &Prescription) -> bool {
        match self {
            PrescriptionFilter::All => true,
            PrescriptionFilter::Doctor(id) => p.doctor_id == *id,
            PrescriptionFilter::Patient(id) => p.patient_id == *id,
            PrescriptionFilter::PharmacyCode(code) => p.pharmacy_code == *code,
        }
    }
}

/// Unique keys the directory enforces.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniqueKey {
    Username,
    Email,
    PharmacyCode,
    InsuranceNumber,
    MedicationName,
}

impl UniqueKey {
    pub fn label(self) -> &'static str {
        match self {
            UniqueKey::Username => "Username",
            UniqueKey::Email => "Email",
            UniqueKey::PharmacyCode => "Pharmacy code",
            UniqueKey::InsuranceNumber => "Patient insurance number",
            UniqueKey::MedicationName => "Medication name",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("{} '{value}' already exists", .key.label())]
    Duplicate { key: UniqueKey, value: String },

    #[error("{0}")]
    NotFound(String),

    #[error("still referenced by {count} prescription(s)")]
    Referenced { count: usize },

    #[error("{0}")]
    DanglingReference(String),

    #[error("stale version: {0}")]
    Stale(String),

    /// The insert guard refused the write.
    #[error("{0}")]
    Rejected(String),

    #[error("the last SUPER_ADMIN cannot be deleted")]
    LastSuperAdmin,

    #[error("directory lock poisoned")]
    Poisoned,
}

impl From<DirectoryError> for DomainError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate { key, .. } => {
                DomainError::conflict(format!("{} already exists. Please choose another.", key.label()))
            }
            DirectoryError::NotFound(msg) => DomainError::not_found(msg),
            DirectoryError::Referenced { count } => DomainError::conflict(format!(
                "Cannot delete medicine because it's still used in {count} prescription(s)."
            )),
            DirectoryError::DanglingReference(msg) => DomainError::conflict(msg),
            DirectoryError::Stale(msg) => DomainError::conflict(msg),
            DirectoryError::Rejected(msg) => DomainError::forbidden(msg),
            DirectoryError::LastSuperAdmin => {
                DomainError::conflict("The last SUPER_ADMIN cannot be deleted.")
            }
            DirectoryError::Poisoned => DomainError::internal("directory lock poisoned"),
        }
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Decides, under the directory's write lock, whether an admin insert may
/// proceed. Receives whether an admin was ever created, even if since deleted.
pub type AdminGuard<'a> = &'a (dyn Fn(bool) -> bool + Send + Sync);

/// Storage for accounts, the medication catalog and prescriptions.
///
/// Every uniqueness and referential rule is enforced inside the mutating call,
/// atomically with the write; callers may pre-check for friendlier errors but
/// must not rely on it.
pub trait EntityDirectory: Send + Sync {
    // ── accounts ────────────────────────────────────────────────────────────
    fn find_person(&self, id: PersonId) -> DirectoryResult<Option<Person>>;
    fn find_person_by_username(&self, username: &str) -> DirectoryResult<Option<Person>>;
    fn find_pharmacist_by_code(&self, pharmacy_code: &str) -> DirectoryResult<Option<Person>>;
    /// Sticky: stays true after every admin has been deleted.
    fn admin_ever_created(&self) -> DirectoryResult<bool>;
    fn insert_person(&self, account: NewAccount) -> DirectoryResult<Person>;
    /// Insert an admin if `guard(admin_ever_created)` allows it, as one atomic step.
    fn insert_admin(&self, account: NewAccount, guard: AdminGuard<'_>) -> DirectoryResult<Person>;
    fn approve_person(&self, username: &str) -> DirectoryResult<(Person, ApprovalOutcome)>;
    /// Remove an admin account. Refuses to remove the last SUPER_ADMIN.
    fn delete_admin(&self, id: PersonId) -> DirectoryResult<Person>;

    // ── medication catalog ──────────────────────────────────────────────────
    fn find_medication(&self, id: MedicationId) -> DirectoryResult<Option<Medication>>;
    fn find_medication_by_name_ignore_case(&self, name: &str) -> DirectoryResult<Option<Medication>>;
    /// Exact, case-sensitive lookup; names without a match are simply absent.
    fn find_medications_by_names(&self, names: &[String]) -> DirectoryResult<Vec<Medication>>;
    fn list_medications(&self) -> DirectoryResult<Vec<Medication>>;
    fn insert_medication(&self, medication: NewMedication) -> DirectoryResult<Medication>;
    fn update_medication(&self, medication: Medication) -> DirectoryResult<Medication>;
    fn count_prescriptions_referencing(&self, id: MedicationId) -> DirectoryResult<usize>;
    fn delete_medication_if_unreferenced(&self, id: MedicationId) -> DirectoryResult<Medication>;

    // ── prescriptions ───────────────────────────────────────────────────────
    fn insert_prescription(&self, prescription: NewPrescription) -> DirectoryResult<Prescription>;
    fn find_prescription(&self, id: PrescriptionId) -> DirectoryResult<Option<Prescription>>;
    fn list_prescriptions(&self, filter: &PrescriptionFilter) -> DirectoryResult<Vec<Prescription>>;
    /// Compare-and-set on the prescription version.
    fn transition_prescription(
        &self,
        id: PrescriptionId,
        expected: ExpectedVersion,
        status: PrescriptionStatus,
    ) -> DirectoryResult<Prescription>;
}

macro_rules! forward_directory {
    ($($name:ident ( $($arg:ident : $ty:ty),* ) -> $ret:ty;)*) => {
        impl<D> EntityDirectory for Arc<D>
        where
            D: EntityDirectory + ?Sized,
        {
            $(
                fn $name(&self, $($arg: $ty),*) -> $ret {
                    (**self).$name($($arg),*)
                }
            )*
        }
    };
}

forward_directory! {
    find_person(id: PersonId) -> DirectoryResult<Option<Person>>;
    find_person_by_username(username: &str) -> DirectoryResult<Option<Person>>;
    find_pharmacist_by_code(pharmacy_code: &str) -> DirectoryResult<Option<Person>>;
    admin_ever_created() -> DirectoryResult<bool>;
    insert_person(account: NewAccount) -> DirectoryResult<Person>;
    insert_admin(account: NewAccount, guard: AdminGuard<'_>) -> DirectoryResult<Person>;
    approve_person(username: &str) -> DirectoryResult<(Person, ApprovalOutcome)>;
    delete_admin(id: PersonId) -> DirectoryResult<Person>;
    find_medication(id: MedicationId) -> DirectoryResult<Option<Medication>>;
    find_medication_by_name_ignore_case(name: &str) -> DirectoryResult<Option<Medication>>;
    find_medications_by_names(names: &[String]) -> DirectoryResult<Vec<Medication>>;
    list_medications() -> DirectoryResult<Vec<Medication>>;
    insert_medication(medication: NewMedication) -> DirectoryResult<Medication>;
    update_medication(medication: Medication) -> DirectoryResult<Medication>;
    count_prescriptions_referencing(id: MedicationId) -> DirectoryResult<usize>;
    delete_medication_if_unreferenced(id: MedicationId) -> DirectoryResult<Medication>;
    insert_prescription(prescription: NewPrescription) -> DirectoryResult<Prescription>;
    find_prescription(id: PrescriptionId) -> DirectoryResult<Option<Prescription>>;
    list_prescriptions(filter: &PrescriptionFilter) -> DirectoryResult<Vec<Prescription>>;
    transition_prescription(id: PrescriptionId, expected: ExpectedVersion, status: PrescriptionStatus) -> DirectoryResult<Prescription>;
}
