use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use medrx_auth::Role;
use medrx_core::{ExpectedVersion, MedicationId, PersonId, PrescriptionId};
use medrx_people::{ApprovalOutcome, Person, Profile};
use medrx_prescriptions::{Medication, NewMedication, Prescription, PrescriptionStatus};

use super::r#trait::{
    AdminGuard, DirectoryError, DirectoryResult, EntityDirectory, NewAccount, NewPrescription,
    PrescriptionFilter, UniqueKey,
};

#[derive(Debug, Default)]
struct Tables {
    persons: BTreeMap<PersonId, Person>,
    medications: BTreeMap<MedicationId, Medication>,
    prescriptions: BTreeMap<PrescriptionId, Prescription>,
    last_person: u64,
    last_medication: u64,
    last_prescription: u64,
    admin_ever_created: bool,
}

impl Tables {
    fn person_conflict(&self, account: &NewAccount) -> Option<DirectoryError> {
        let duplicate = |key, value: &str| {
            Some(DirectoryError::Duplicate {
                key,
                value: value.to_string(),
            })
        };

        for p in self.persons.values() {
            if p.username == account.username {
                return duplicate(UniqueKey::Username, &account.username);
            }
            if p.email.eq_ignore_ascii_case(&account.email) {
                return duplicate(UniqueKey::Email, &account.email);
            }
        }

        match &account.profile {
            Profile::Pharmacist { pharmacy_code, .. }
                if self.persons.values().any(|p| p.pharmacy_code() == Some(pharmacy_code.as_str())) =>
            {
                duplicate(UniqueKey::PharmacyCode, pharmacy_code)
            }
            Profile::Patient {
                patient_insurance_number,
                ..
            } if self
                .persons
                .values()
                .any(|p| p.insurance_number() == Some(patient_insurance_number.as_str())) =>
            {
                duplicate(UniqueKey::InsuranceNumber, patient_insurance_number)
            }
            _ => None,
        }
    }

    fn medication_name_taken(&self, name: &str, except: Option<MedicationId>) -> bool {
        self.medications
            .values()
            .any(|m| Some(m.id) != except && m.name.to_lowercase() == name.to_lowercase())
    }

    fn insert_account(&mut self, account: NewAccount) -> DirectoryResult<Person> {
        if let Some(err) = self.person_conflict(&account) {
            return Err(err);
        }
        self.last_person += 1;
        let person = account.with_id(PersonId::new(self.last_person));
        self.admin_ever_created |= person.is_admin();
        self.persons.insert(person.id, person.clone());
        Ok(person)
    }

    fn references(&self, id: MedicationId) -> usize {
        self.prescriptions.values().filter(|p| p.references(id)).count()
    }
}

/// In-memory directory for tests/dev and single-process deployments.
///
/// One `RwLock` guards every table, so each mutating call is atomic with the
/// checks it performs.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    tables: RwLock<Tables>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DirectoryResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| DirectoryError::Poisoned)
    }

    fn write(&self) -> DirectoryResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| DirectoryError::Poisoned)
    }
}

impl EntityDirectory for InMemoryDirectory {
    fn find_person(&self, id: PersonId) -> DirectoryResult<Option<Person>> {
        Ok(self.read()?.persons.get(&id).cloned())
    }

    fn find_person_by_username(&self, username: &str) -> DirectoryResult<Option<Person>> {
        Ok(self
            .read()?
            .persons
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    fn find_pharmacist_by_code(&self, pharmacy_code: &str) -> DirectoryResult<Option<Person>> {
        Ok(self
            .read()?
            .persons
            .values()
            .find(|p| p.pharmacy_code() == Some(pharmacy_code))
            .cloned())
    }

    fn admin_ever_created(&self) -> DirectoryResult<bool> {
        Ok(self.read()?.admin_ever_created)
    }

    fn insert_person(&self, account: NewAccount) -> DirectoryResult<Person> {
        self.write()?.insert_account(account)
    }

    fn insert_admin(&self, account: NewAccount, guard: AdminGuard<'_>) -> DirectoryResult<Person> {
        let mut tables = self.write()?;
        if !guard(tables.admin_ever_created) {
            return Err(DirectoryError::Rejected(
                "admin registration refused".to_string(),
            ));
        }
        tables.insert_account(account)
    }

    fn approve_person(&self, username: &str) -> DirectoryResult<(Person, ApprovalOutcome)> {
        let mut tables = self.write()?;
        let person = tables
            .persons
            .values_mut()
            .find(|p| p.username == username)
            .ok_or_else(|| DirectoryError::NotFound(format!("User with username {username} not found")))?;
        let outcome = person.approve();
        Ok((person.clone(), outcome))
    }

    fn delete_admin(&self, id: PersonId) -> DirectoryResult<Person> {
        let mut tables = self.write()?;
        let role = match tables.persons.get(&id) {
            Some(p) if p.is_admin() => p.role(),
            _ => return Err(DirectoryError::NotFound(format!("Admin with ID {id} not found."))),
        };
        if role == Role::SuperAdmin {
            let super_admins = tables
                .persons
                .values()
                .filter(|p| p.is_admin() && p.role() == Role::SuperAdmin)
                .count();
            if super_admins <= 1 {
                return Err(DirectoryError::LastSuperAdmin);
            }
        }
        tables
            .persons
            .remove(&id)
            .ok_or_else(|| DirectoryError::NotFound(format!("Admin with ID {id} not found.")))
    }

    fn find_medication(&self, id: MedicationId) -> DirectoryResult<Option<Medication>> {
        Ok(self.read()?.medications.get(&id).cloned())
    }

    fn find_medication_by_name_ignore_case(&self, name: &str) -> DirectoryResult<Option<Medication>> {
        let needle = name.to_lowercase();
        Ok(self
            .read()?
            .medications
            .values()
            .find(|m| m.name.to_lowercase() == needle)
            .cloned())
    }

    fn find_medications_by_names(&self, names: &[String]) -> DirectoryResult<Vec<Medication>> {
        let tables = self.read()?;
        Ok(names
            .iter()
            .filter_map(|n| tables.medications.values().find(|m| &m.name == n).cloned())
            .collect())
    }

    fn list_medications(&self) -> DirectoryResult<Vec<Medication>> {
        Ok(self.read()?.medications.values().cloned().collect())
    }

    fn insert_medication(&self, medication: NewMedication) -> DirectoryResult<Medication> {
        let mut tables = self.write()?;
        if tables.medication_name_taken(&medication.name, None) {
            return Err(DirectoryError::Duplicate {
                key: UniqueKey::MedicationName,
                value: medication.name,
            });
        }
        tables.last_medication += 1;
        let stored = medication.with_id(MedicationId::new(tables.last_medication));
        tables.medications.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update_medication(&self, medication: Medication) -> DirectoryResult<Medication> {
        let mut tables = self.write()?;
        if !tables.medications.contains_key(&medication.id) {
            return Err(DirectoryError::NotFound(format!(
                "Medication with id {} not found",
                medication.id
            )));
        }
        if tables.medication_name_taken(&medication.name, Some(medication.id)) {
            return Err(DirectoryError::Duplicate {
                key: UniqueKey::MedicationName,
                value: medication.name,
            });
        }
        tables.medications.insert(medication.id, medication.clone());
        Ok(medication)
    }

    fn count_prescriptions_referencing(&self, id: MedicationId) -> DirectoryResult<usize> {
        Ok(self.read()?.references(id))
    }

    fn delete_medication_if_unreferenced(&self, id: MedicationId) -> DirectoryResult<Medication> {
        let mut tables = self.write()?;
        if !tables.medications.contains_key(&id) {
            return Err(DirectoryError::NotFound(format!("Medication with id {id} not found")));
        }
        let count = tables.references(id);
        if count > 0 {
            return Err(DirectoryError::Referenced { count });
        }
        tables
            .medications
            .remove(&id)
            .ok_or_else(|| DirectoryError::NotFound(format!("Medication with id {id} not found")))
    }

    fn insert_prescription(&self, new: NewPrescription) -> DirectoryResult<Prescription> {
        let mut tables = self.write()?;

        let is = |id: PersonId, want: fn(&Profile) -> bool| {
            tables.persons.get(&id).is_some_and(|p| want(&p.profile))
        };
        if !is(new.patient_id, |p| matches!(p, Profile::Patient { .. })) {
            return Err(DirectoryError::DanglingReference(format!(
                "Patient with ID {} does not exist.",
                new.patient_id
            )));
        }
        if !is(new.doctor_id, |p| matches!(p, Profile::Doctor { .. })) {
            return Err(DirectoryError::DanglingReference(format!(
                "Doctor with ID {} does not exist.",
                new.doctor_id
            )));
        }
        if let Some(missing) = new.medicine.iter().find(|m| !tables.medications.contains_key(*m)) {
            return Err(DirectoryError::DanglingReference(format!(
                "Medication with id {missing} no longer exists."
            )));
        }
        if !tables
            .persons
            .values()
            .any(|p| p.pharmacy_code() == Some(new.pharmacy_code.as_str()))
        {
            return Err(DirectoryError::DanglingReference(
                "Pharmacy code doesn't exist.".to_string(),
            ));
        }

        tables.last_prescription += 1;
        let stored = Prescription {
            id: PrescriptionId::new(tables.last_prescription),
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            prescription_date: new.prescription_date,
            prescription_type: new.prescription_type,
            medicine: new.medicine,
            qr_codes: new.qr_codes,
            pharmacy_code: new.pharmacy_code,
            prescription_status: PrescriptionStatus::Active,
            version: Prescription::INITIAL_VERSION,
        };
        tables.prescriptions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn find_prescription(&self, id: PrescriptionId) -> DirectoryResult<Option<Prescription>> {
        Ok(self.read()?.prescriptions.get(&id).cloned())
    }

    fn list_prescriptions(&self, filter: &PrescriptionFilter) -> DirectoryResult<Vec<Prescription>> {
        Ok(self
            .read()?
            .prescriptions
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    fn transition_prescription(
        &self,
        id: PrescriptionId,
        expected: ExpectedVersion,
        status: PrescriptionStatus,
    ) -> DirectoryResult<Prescription> {
        let mut tables = self.write()?;
        let prescription = tables
            .prescriptions
            .get_mut(&id)
            .ok_or_else(|| DirectoryError::NotFound(format!("Prescription with ID {id} not found.")))?;

        if !expected.matches(prescription.version) {
            return Err(DirectoryError::Stale(format!(
                "prescription {id} was modified concurrently (expected {expected:?}, found {})",
                prescription.version
            )));
        }
        prescription.apply(status);
        Ok(prescription.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::NaiveDate;
    use medrx_people::Address;
    use medrx_prescriptions::{MedicationType, PrescriptionType};

    use super::*;

    fn account(username: &str, profile: Profile) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "F".to_string(),
            last_name: "L".to_string(),
            email: format!("{username}@example.com"),
            phone: "01234567890".to_string(),
            approved: true,
            profile,
        }
    }

    fn doctor(username: &str) -> NewAccount {
        account(username, Profile::Doctor { office_name: "Office".into() })
    }

    fn pharmacist(username: &str, code: &str) -> NewAccount {
        account(
            username,
            Profile::Pharmacist {
                pharmacy_name: "Apotheke".into(),
                pharmacy_code: code.into(),
            },
        )
    }

    fn patient(username: &str, insurance: &str) -> NewAccount {
        account(
            username,
            Profile::Patient {
                address: Address {
                    street: "Main 1".into(),
                    city: "Hamburg".into(),
                    state: "HH".into(),
                    zip_code: "21073".into(),
                    country: "DE".into(),
                },
                birthday: NaiveDate::from_ymd_opt(1985, 4, 12).unwrap(),
                patient_insurance_number: insurance.into(),
            },
        )
    }

    fn admin(username: &str, level: Role) -> NewAccount {
        account(username, Profile::Admin { admin_level: level })
    }

    fn medication(name: &str) -> NewMedication {
        NewMedication {
            name: name.into(),
            description: "d".into(),
            dosage: "1".into(),
            medication_type: MedicationType::Pill,
        }
    }

    struct Seeded {
        dir: InMemoryDirectory,
        patient: PersonId,
        doctor: PersonId,
        aspirin: MedicationId,
    }

    fn seeded() -> Seeded {
        let dir = InMemoryDirectory::new();
        let patient = dir.insert_person(patient("patient1", "A123456789")).unwrap().id;
        let doctor = dir.insert_person(doctor("doc1")).unwrap().id;
        dir.insert_person(pharmacist("pharma1", "PHARMA0001")).unwrap();
        let aspirin = dir.insert_medication(medication("Aspirin")).unwrap().id;
        Seeded { dir, patient, doctor, aspirin }
    }

    fn new_prescription(s: &Seeded) -> NewPrescription {
        NewPrescription {
            patient_id: s.patient,
            doctor_id: s.doctor,
            prescription_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            prescription_type: PrescriptionType::Privat,
            medicine: vec![s.aspirin],
            qr_codes: vec!["QR".into()],
            pharmacy_code: "PHARMA0001".into(),
        }
    }

    #[test]
    fn assigns_sequential_ids() {
        let s = seeded();
        assert_eq!(s.patient, PersonId::new(1));
        assert_eq!(s.doctor, PersonId::new(2));
        assert_eq!(s.aspirin, MedicationId::new(1));
    }

    #[test]
    fn unique_keys_are_enforced() {
        let s = seeded();
        let dup_user = s.dir.insert_person(doctor("doc1")).unwrap_err();
        assert!(matches!(dup_user, DirectoryError::Duplicate { key: UniqueKey::Username, .. }));

        let mut other = doctor("doc2");
        other.email = "DOC1@example.com".into();
        assert!(matches!(
            s.dir.insert_person(other),
            Err(DirectoryError::Duplicate { key: UniqueKey::Email, .. })
        ));

        assert!(matches!(
            s.dir.insert_person(pharmacist("pharma2", "PHARMA0001")),
            Err(DirectoryError::Duplicate { key: UniqueKey::PharmacyCode, .. })
        ));
        assert!(matches!(
            s.dir.insert_person(patient("patient2", "A123456789")),
            Err(DirectoryError::Duplicate { key: UniqueKey::InsuranceNumber, .. })
        ));
        assert!(matches!(
            s.dir.insert_medication(medication("ASPIRIN")),
            Err(DirectoryError::Duplicate { key: UniqueKey::MedicationName, .. })
        ));
    }

    #[test]
    fn name_lookup_is_exact_but_duplicate_check_ignores_case() {
        let s = seeded();
        let found = s
            .dir
            .find_medications_by_names(&["aspirin".to_string(), "Aspirin".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(s.dir.find_medication_by_name_ignore_case("aSpIrIn").unwrap().is_some());
    }

    #[test]
    fn admin_guard_runs_under_the_lock() {
        let dir = InMemoryDirectory::new();
        let first = dir.insert_admin(admin("root", Role::SuperAdmin), &|exists| !exists);
        assert!(first.is_ok());
        let second = dir.insert_admin(admin("root2", Role::Moderator), &|exists| !exists);
        assert!(matches!(second, Err(DirectoryError::Rejected(_))));
        assert!(dir.admin_ever_created().unwrap());
    }

    #[test]
    fn concurrent_bootstrap_admits_exactly_one() {
        let dir = Arc::new(InMemoryDirectory::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dir = Arc::clone(&dir);
                thread::spawn(move || {
                    dir.insert_admin(admin(&format!("admin{i}"), Role::SuperAdmin), &|exists| !exists)
                        .is_ok()
                })
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
        let persons = (1..=8u64)
            .filter_map(|i| dir.find_person(PersonId::new(i)).unwrap())
            .count();
        assert_eq!(persons, 1);
    }

    #[test]
    fn approve_flips_once() {
        let s = seeded();
        s.dir.insert_person({
            let mut d = doctor("doc2");
            d.approved = false;
            d
        })
        .unwrap();
        let (p, outcome) = s.dir.approve_person("doc2").unwrap();
        assert!(p.approved);
        assert_eq!(outcome, ApprovalOutcome::Approved);
        let (_, again) = s.dir.approve_person("doc2").unwrap();
        assert_eq!(again, ApprovalOutcome::AlreadyApproved);
        assert!(matches!(s.dir.approve_person("ghost"), Err(DirectoryError::NotFound(_))));
    }

    #[test]
    fn referenced_medication_cannot_be_deleted() {
        let s = seeded();
        s.dir.insert_prescription(new_prescription(&s)).unwrap();
        assert_eq!(s.dir.count_prescriptions_referencing(s.aspirin).unwrap(), 1);
        assert_eq!(
            s.dir.delete_medication_if_unreferenced(s.aspirin),
            Err(DirectoryError::Referenced { count: 1 })
        );
        let unused = s.dir.insert_medication(medication("Voltaren")).unwrap().id;
        assert!(s.dir.delete_medication_if_unreferenced(unused).is_ok());
        assert!(s.dir.find_medication(unused).unwrap().is_none());
    }

    #[test]
    fn prescription_insert_rechecks_references() {
        let s = seeded();
        let mut bad = new_prescription(&s);
        bad.pharmacy_code = "NOPE".into();
        assert!(matches!(s.dir.insert_prescription(bad), Err(DirectoryError::DanglingReference(_))));

        let mut bad = new_prescription(&s);
        bad.medicine = vec![MedicationId::new(99)];
        assert!(matches!(s.dir.insert_prescription(bad), Err(DirectoryError::DanglingReference(_))));

        let mut swapped = new_prescription(&s);
        swapped.patient_id = s.doctor;
        assert!(s.dir.insert_prescription(swapped).is_err());
    }

    #[test]
    fn transition_is_compare_and_set() {
        let s = seeded();
        let p = s.dir.insert_prescription(new_prescription(&s)).unwrap();
        assert_eq!(p.version, Prescription::INITIAL_VERSION);

        let done = s
            .dir
            .transition_prescription(p.id, ExpectedVersion::Exact(p.version), PrescriptionStatus::Fulfilled)
            .unwrap();
        assert_eq!(done.prescription_status, PrescriptionStatus::Fulfilled);
        assert_eq!(done.version, p.version + 1);

        let stale = s
            .dir
            .transition_prescription(p.id, ExpectedVersion::Exact(p.version), PrescriptionStatus::Canceled);
        assert!(matches!(stale, Err(DirectoryError::Stale(_))));
    }

    #[test]
    fn list_filters() {
        let s = seeded();
        s.dir.insert_prescription(new_prescription(&s)).unwrap();
        assert_eq!(s.dir.list_prescriptions(&PrescriptionFilter::Doctor(s.doctor)).unwrap().len(), 1);
        assert_eq!(s.dir.list_prescriptions(&PrescriptionFilter::Patient(s.doctor)).unwrap().len(), 0);
        assert_eq!(
            s.dir
                .list_prescriptions(&PrescriptionFilter::PharmacyCode("PHARMA0001".into()))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn delete_admin_only_removes_admins() {
        let s = seeded();
        assert!(matches!(s.dir.delete_admin(s.doctor), Err(DirectoryError::NotFound(_))));
        s.dir.insert_admin(admin("root", Role::SuperAdmin), &|_| true).unwrap();
        let moderator = s.dir.insert_admin(admin("mod1", Role::Moderator), &|_| true).unwrap();
        assert_eq!(s.dir.delete_admin(moderator.id).unwrap().username, "mod1");
        assert!(s.dir.find_person(moderator.id).unwrap().is_none());
    }

    #[test]
    fn last_super_admin_is_kept() {
        let dir = InMemoryDirectory::new();
        let root = dir.insert_admin(admin("root", Role::SuperAdmin), &|_| true).unwrap();
        assert_eq!(dir.delete_admin(root.id), Err(DirectoryError::LastSuperAdmin));

        let root2 = dir.insert_admin(admin("root2", Role::SuperAdmin), &|_| true).unwrap();
        assert!(dir.delete_admin(root.id).is_ok());
        assert_eq!(dir.delete_admin(root2.id), Err(DirectoryError::LastSuperAdmin));
    }

    #[test]
    fn bootstrap_flag_survives_admin_deletion() {
        let dir = InMemoryDirectory::new();
        assert!(!dir.admin_ever_created().unwrap());
        let moderator = dir.insert_admin(admin("mod1", Role::Moderator), &|ever| !ever).unwrap();
        dir.delete_admin(moderator.id).unwrap();
        assert!(dir.admin_ever_created().unwrap());

        let again = dir.insert_admin(admin("intruder", Role::SuperAdmin), &|ever| !ever);
        assert!(matches!(again, Err(DirectoryError::Rejected(_))));
    }
}
