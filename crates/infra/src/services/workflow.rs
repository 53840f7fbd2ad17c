//! Prescription issuance, cancellation, fulfillment and reads.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use medrx_core::{DomainError, DomainResult, ExpectedVersion, PersonId, PrescriptionId};
use medrx_people::{Person, Profile};
use medrx_prescriptions::{
    Medication, Prescription, PrescriptionDraft, PrescriptionStatus, PrescriptionType, Transition,
};

use crate::directory::{DirectoryError, EntityDirectory, NewPrescription, PrescriptionFilter};

/// A prescription with its catalog rows resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDetails {
    pub id: PrescriptionId,
    pub patient_id: PersonId,
    pub doctor_id: PersonId,
    pub prescription_date: NaiveDate,
    pub prescription_type: PrescriptionType,
    pub medicine: Vec<Medication>,
    pub qr_codes: Vec<String>,
    pub pharmacy_code: String,
    pub prescription_status: PrescriptionStatus,
    pub version: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    Unchanged,
}

pub struct PrescriptionWorkflow {
    directory: Arc<dyn EntityDirectory>,
}

impl PrescriptionWorkflow {
    pub fn new(directory: Arc<dyn EntityDirectory>) -> Self {
        Self { directory }
    }

    /// Issue a prescription from `doctor_id` to `patient_id`.
    ///
    /// Checks run fail-fast: draft fields, patient, doctor, medication names,
    /// pharmacy code. The stored medicine list holds catalog ids only.
    pub fn issue(
        &self,
        doctor_id: PersonId,
        patient_id: PersonId,
        draft: &PrescriptionDraft,
    ) -> DomainResult<PrescriptionDetails> {
        let checked = draft.check().inspect_err(|e| {
            tracing::warn!(%doctor_id, %patient_id, error = %e, "prescription draft rejected");
        })?;

        self.person_with(patient_id, |p| matches!(p, Profile::Patient { .. }))?
            .ok_or_else(|| DomainError::not_found(format!("Patient with ID {patient_id} does not exist.")))?;
        self.person_with(doctor_id, |p| matches!(p, Profile::Doctor { .. }))?
            .ok_or_else(|| DomainError::not_found(format!("Doctor with ID {doctor_id} does not exist.")))?;

        let found = self.directory.find_medications_by_names(&checked.medication_names)?;
        let found_names: BTreeSet<&str> = found.iter().map(|m| m.name.as_str()).collect();
        let missing: BTreeSet<String> = checked
            .medication_names
            .iter()
            .filter(|n| !found_names.contains(n.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            tracing::warn!(%doctor_id, ?missing, "prescription names unknown medications");
            return Err(DomainError::MissingMedications(missing));
        }

        if self.directory.find_pharmacist_by_code(&checked.pharmacy_code)?.is_none() {
            return Err(DomainError::validation("Pharmacy code doesn't exist."));
        }

        // keep the draft's order
        let medicine = checked
            .medication_names
            .iter()
            .filter_map(|name| found.iter().find(|m| &m.name == name).map(|m| m.id))
            .collect();

        let stored = self.directory.insert_prescription(NewPrescription {
            patient_id,
            doctor_id,
            prescription_date: checked.prescription_date,
            prescription_type: checked.prescription_type,
            medicine,
            qr_codes: checked.qr_codes,
            pharmacy_code: checked.pharmacy_code,
        })?;

        tracing::info!(
            prescription_id = %stored.id,
            %doctor_id,
            %patient_id,
            pharmacy_code = %stored.pharmacy_code,
            "prescription issued"
        );
        self.details(stored)
    }

    /// Cancel a prescription owned by `doctor_id`. Cancelling twice is a no-op.
    pub fn cancel(
        &self,
        doctor_id: PersonId,
        prescription_id: PrescriptionId,
    ) -> DomainResult<(PrescriptionDetails, TransitionOutcome)> {
        self.require_doctor(doctor_id)?;
        let current = self
            .directory
            .find_prescription(prescription_id)?
            .filter(|p| p.doctor_id == doctor_id)
            .ok_or_else(|| DomainError::not_found("No prescription linked to doctor found."))?;

        let transition = current.prescription_status.cancel().inspect_err(|e| {
            tracing::warn!(%prescription_id, %doctor_id, error = %e, "cancel refused");
        })?;
        self.apply(current, transition)
    }

    /// Mark a prescription addressed to the pharmacist's pharmacy as fulfilled.
    pub fn fulfill(
        &self,
        pharmacist_id: PersonId,
        prescription_id: PrescriptionId,
    ) -> DomainResult<PrescriptionDetails> {
        let code = self.pharmacy_code_of(pharmacist_id)?;
        let current = self
            .directory
            .find_prescription(prescription_id)?
            .filter(|p| p.pharmacy_code == code)
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "No prescription with ID {prescription_id} found for pharmacy code {code}."
                ))
            })?;

        let transition = current.prescription_status.fulfill().inspect_err(|e| {
            tracing::warn!(%prescription_id, %pharmacist_id, error = %e, "fulfill refused");
        })?;
        let (details, _) = self.apply(current, transition)?;
        Ok(details)
    }

    pub fn doctor_prescriptions(&self, doctor_id: PersonId) -> DomainResult<Vec<PrescriptionDetails>> {
        self.require_doctor(doctor_id)?;
        self.list(&PrescriptionFilter::Doctor(doctor_id))
    }

    pub fn doctor_prescription(
        &self,
        doctor_id: PersonId,
        prescription_id: PrescriptionId,
    ) -> DomainResult<PrescriptionDetails> {
        self.require_doctor(doctor_id)?;
        let p = self
            .directory
            .find_prescription(prescription_id)?
            .filter(|p| p.doctor_id == doctor_id)
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "No prescription with ID {prescription_id} found for doctor with ID {doctor_id}."
                ))
            })?;
        self.details(p)
    }

    pub fn pharmacy_prescriptions(&self, pharmacist_id: PersonId) -> DomainResult<Vec<PrescriptionDetails>> {
        let code = self.pharmacy_code_of(pharmacist_id)?;
        self.list(&PrescriptionFilter::PharmacyCode(code))
    }

    pub fn patient_prescriptions(&self, patient_id: PersonId) -> DomainResult<Vec<PrescriptionDetails>> {
        self.person_with(patient_id, |p| matches!(p, Profile::Patient { .. }))?
            .ok_or_else(|| DomainError::not_found(format!("No patient with ID {patient_id} found.")))?;
        self.list(&PrescriptionFilter::Patient(patient_id))
    }

    pub fn all_prescriptions(&self) -> DomainResult<Vec<PrescriptionDetails>> {
        self.list(&PrescriptionFilter::All)
    }

    pub fn prescription(&self, id: PrescriptionId) -> DomainResult<PrescriptionDetails> {
        let p = self
            .directory
            .find_prescription(id)?
            .ok_or_else(|| DomainError::not_found(format!("No prescription with ID {id} found.")))?;
        self.details(p)
    }

    fn apply(
        &self,
        current: Prescription,
        transition: Transition,
    ) -> DomainResult<(PrescriptionDetails, TransitionOutcome)> {
        match transition {
            Transition::Unchanged => Ok((self.details(current)?, TransitionOutcome::Unchanged)),
            Transition::To(status) => {
                let updated = self
                    .directory
                    .transition_prescription(current.id, ExpectedVersion::Exact(current.version), status)
                    .map_err(|e| match e {
                        DirectoryError::Stale(_) => DomainError::conflict(
                            "Prescription was modified concurrently. Please retry.",
                        ),
                        other => other.into(),
                    })?;
                tracing::info!(
                    prescription_id = %updated.id,
                    from = ?current.prescription_status,
                    to = ?updated.prescription_status,
                    version = updated.version,
                    "prescription status changed"
                );
                Ok((self.details(updated)?, TransitionOutcome::Applied))
            }
        }
    }

    fn list(&self, filter: &PrescriptionFilter) -> DomainResult<Vec<PrescriptionDetails>> {
        self.directory
            .list_prescriptions(filter)?
            .into_iter()
            .map(|p| self.details(p))
            .collect()
    }

    fn details(&self, p: Prescription) -> DomainResult<PrescriptionDetails> {
        let mut medicine = Vec::with_capacity(p.medicine.len());
        for id in &p.medicine {
            match self.directory.find_medication(*id)? {
                Some(m) => medicine.push(m),
                None => {
                    tracing::error!(prescription_id = %p.id, medication_id = %id, "dangling medication reference");
                    return Err(DomainError::internal(format!(
                        "prescription {} references missing medication {id}",
                        p.id
                    )));
                }
            }
        }
        Ok(PrescriptionDetails {
            id: p.id,
            patient_id: p.patient_id,
            doctor_id: p.doctor_id,
            prescription_date: p.prescription_date,
            prescription_type: p.prescription_type,
            medicine,
            qr_codes: p.qr_codes,
            pharmacy_code: p.pharmacy_code,
            prescription_status: p.prescription_status,
            version: p.version,
        })
    }

    fn person_with(&self, id: PersonId, kind: impl Fn(&Profile) -> bool) -> DomainResult<Option<Person>> {
        Ok(self.directory.find_person(id)?.filter(|p| kind(&p.profile)))
    }

    fn require_doctor(&self, id: PersonId) -> DomainResult<Person> {
        self.person_with(id, |p| matches!(p, Profile::Doctor { .. }))?
            .ok_or_else(|| DomainError::not_found(format!("No doctor with ID {id} found.")))
    }

    fn pharmacy_code_of(&self, id: PersonId) -> DomainResult<String> {
        self.directory
            .find_person(id)?
            .and_then(|p| p.pharmacy_code().map(str::to_string))
            .ok_or_else(|| DomainError::not_found(format!("No pharmacist with ID {id} found.")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::services::tests_support::{World, world};

    fn draft(names: &[&str], code: &str) -> PrescriptionDraft {
        let medicine: Vec<_> = names.iter().map(|n| json!({ "name": n })).collect();
        serde_json::from_value(json!({
            "prescriptionDate": "2025-03-01",
            "prescriptionType": "E_REZEPT",
            "medicine": medicine,
            "qrCodes": ["QR-1"],
            "pharmacyCode": code,
            "prescriptionStatus": "ACTIVE",
        }))
        .unwrap()
    }

    fn issued(w: &World) -> PrescriptionDetails {
        w.workflow
            .issue(w.doctor, w.patient, &draft(&["Aspirin"], "PHARMA0001"))
            .unwrap()
    }

    #[test]
    fn issue_stores_catalog_rows_not_payload() {
        let w = world();
        let body: PrescriptionDraft = serde_json::from_value(json!({
            "prescriptionDate": "2025-03-01",
            "prescriptionType": "PRIVAT",
            "medicine": [{ "name": "Aspirin", "description": "forged", "dosage": "999 mg" }],
            "qrCodes": ["QR-1"],
            "pharmacyCode": "PHARMA0001",
            "prescriptionStatus": "ACTIVE",
        }))
        .unwrap();
        let p = w.workflow.issue(w.doctor, w.patient, &body).unwrap();
        assert_eq!(p.prescription_status, PrescriptionStatus::Active);
        assert_eq!(p.medicine.len(), 1);
        assert_eq!(p.medicine[0].description, "Pain relief");
        assert_eq!(p.medicine[0].dosage, "1 pill per day");
    }

    #[test]
    fn issue_enumerates_missing_names() {
        let w = world();
        let err = w
            .workflow
            .issue(w.doctor, w.patient, &draft(&["Aspirin", "Unobtainium", "aspirin"], "PHARMA0001"))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingMedications(BTreeSet::from(["Unobtainium".to_string(), "aspirin".to_string()]))
        );
    }

    #[test]
    fn issue_checks_run_in_order() {
        let w = world();
        let ghost = PersonId::new(999);

        let mut bad_status = draft(&["Unobtainium"], "NOPE");
        bad_status.prescription_status = Some(PrescriptionStatus::Canceled);
        assert!(matches!(
            w.workflow.issue(ghost, ghost, &bad_status),
            Err(DomainError::Validation(_))
        ));

        assert_eq!(
            w.workflow.issue(ghost, ghost, &draft(&["Unobtainium"], "NOPE")),
            Err(DomainError::not_found("Patient with ID 999 does not exist."))
        );
        assert_eq!(
            w.workflow.issue(ghost, w.patient, &draft(&["Unobtainium"], "NOPE")),
            Err(DomainError::not_found("Doctor with ID 999 does not exist."))
        );
        assert!(matches!(
            w.workflow.issue(w.doctor, w.patient, &draft(&["Unobtainium"], "NOPE")),
            Err(DomainError::MissingMedications(_))
        ));
        assert_eq!(
            w.workflow.issue(w.doctor, w.patient, &draft(&["Aspirin"], "NOPE")),
            Err(DomainError::validation("Pharmacy code doesn't exist."))
        );
    }

    #[test]
    fn cancel_is_idempotent() {
        let w = world();
        let p = issued(&w);
        let (first, outcome) = w.workflow.cancel(w.doctor, p.id).unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);
        assert_eq!(first.prescription_status, PrescriptionStatus::Canceled);

        let (second, outcome) = w.workflow.cancel(w.doctor, p.id).unwrap();
        assert_eq!(outcome, TransitionOutcome::Unchanged);
        assert_eq!(second.version, first.version);
    }

    #[test]
    fn cancel_requires_ownership() {
        let w = world();
        let p = issued(&w);
        assert_eq!(
            w.workflow.cancel(w.other_doctor, p.id),
            Err(DomainError::not_found("No prescription linked to doctor found."))
        );
        assert_eq!(
            w.workflow.cancel(PersonId::new(999), p.id),
            Err(DomainError::not_found("No doctor with ID 999 found."))
        );
    }

    #[test]
    fn fulfill_then_cancel_conflicts() {
        let w = world();
        let p = issued(&w);
        let done = w.workflow.fulfill(w.pharmacist, p.id).unwrap();
        assert_eq!(done.prescription_status, PrescriptionStatus::Fulfilled);

        assert!(matches!(w.workflow.fulfill(w.pharmacist, p.id), Err(DomainError::Conflict(_))));
        assert!(matches!(w.workflow.cancel(w.doctor, p.id), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn fulfill_at_wrong_pharmacy_is_not_found() {
        let w = world();
        let p = issued(&w);
        assert_eq!(
            w.workflow.fulfill(w.other_pharmacist, p.id),
            Err(DomainError::not_found(format!(
                "No prescription with ID {} found for pharmacy code PHARMA0002.",
                p.id
            )))
        );
        assert!(matches!(
            w.workflow.fulfill(w.other_pharmacist, PrescriptionId::new(101)),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn reads_are_scoped() {
        let w = world();
        let p = issued(&w);
        assert_eq!(w.workflow.doctor_prescriptions(w.doctor).unwrap().len(), 1);
        assert!(w.workflow.doctor_prescriptions(w.other_doctor).unwrap().is_empty());
        assert_eq!(w.workflow.patient_prescriptions(w.patient).unwrap().len(), 1);
        assert_eq!(w.workflow.pharmacy_prescriptions(w.pharmacist).unwrap().len(), 1);
        assert!(w.workflow.pharmacy_prescriptions(w.other_pharmacist).unwrap().is_empty());
        assert_eq!(w.workflow.all_prescriptions().unwrap().len(), 1);
        assert_eq!(w.workflow.prescription(p.id).unwrap(), p);
        assert!(matches!(
            w.workflow.doctor_prescription(w.other_doctor, p.id),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn empty_directory_has_no_pharmacist() {
        let wf = PrescriptionWorkflow::new(Arc::new(InMemoryDirectory::new()));
        assert_eq!(
            wf.pharmacy_prescriptions(PersonId::new(1)),
            Err(DomainError::not_found("No pharmacist with ID 1 found."))
        );
    }
}
