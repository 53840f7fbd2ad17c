//! Medication catalog maintenance.

use std::sync::Arc;

use medrx_core::{DomainError, DomainResult, MedicationId};
use medrx_prescriptions::{Medication, MedicationRequest};

use crate::directory::{DirectoryError, EntityDirectory, UniqueKey};

pub struct MedicationCatalog {
    directory: Arc<dyn EntityDirectory>,
}

fn name_taken(name: &str) -> DomainError {
    DomainError::conflict(format!(
        "Medication with name '{name}' already exists. Please provide another medication"
    ))
}

fn not_found(id: MedicationId) -> DomainError {
    DomainError::not_found(format!("Medication with ID {id} not found"))
}

/// Duplicate names get the catalog wording instead of the generic one.
fn map_write_error(err: DirectoryError, name: &str) -> DomainError {
    match err {
        DirectoryError::Duplicate {
            key: UniqueKey::MedicationName,
            ..
        } => name_taken(name),
        other => other.into(),
    }
}

impl MedicationCatalog {
    pub fn new(directory: Arc<dyn EntityDirectory>) -> Self {
        Self { directory }
    }

    pub fn list(&self) -> DomainResult<Vec<Medication>> {
        Ok(self.directory.list_medications()?)
    }

    pub fn get(&self, id: MedicationId) -> DomainResult<Medication> {
        self.directory.find_medication(id)?.ok_or_else(|| not_found(id))
    }

    pub fn create(&self, request: &MedicationRequest) -> DomainResult<Medication> {
        let new = request.validate_new()?;
        if self.directory.find_medication_by_name_ignore_case(&new.name)?.is_some() {
            tracing::warn!(name = %new.name, "medication name already taken");
            return Err(name_taken(&new.name));
        }

        let name = new.name.clone();
        let created = self
            .directory
            .insert_medication(new)
            .map_err(|e| map_write_error(e, &name))?;
        tracing::info!(medication_id = %created.id, name = %created.name, "medication created");
        Ok(created)
    }

    /// Partial update; absent fields keep their value.
    pub fn update(&self, id: MedicationId, request: &MedicationRequest) -> DomainResult<Medication> {
        let current = self.get(id)?;
        let updated = request.apply_to(&current)?;
        let name = updated.name.clone();
        let stored = self
            .directory
            .update_medication(updated)
            .map_err(|e| map_write_error(e, &name))?;
        tracing::info!(medication_id = %id, "medication updated");
        Ok(stored)
    }

    /// Delete an entry no prescription references.
    pub fn delete(&self, id: MedicationId) -> DomainResult<Medication> {
        let removed = self.directory.delete_medication_if_unreferenced(id).inspect_err(|e| {
            tracing::warn!(medication_id = %id, error = %e, "medication not deleted");
        })?;
        tracing::info!(medication_id = %id, name = %removed.name, "medication deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::services::tests_support::world;

    fn request(body: serde_json::Value) -> MedicationRequest {
        serde_json::from_value(body).unwrap()
    }

    fn ibuprofen() -> MedicationRequest {
        request(json!({
            "name": "Ibuprofen",
            "description": "Anti-inflammatory",
            "dosage": "400 mg",
            "medicationType": "PILL",
        }))
    }

    #[test]
    fn create_then_get() {
        let catalog = MedicationCatalog::new(Arc::new(InMemoryDirectory::new()));
        let created = catalog.create(&ibuprofen()).unwrap();
        assert_eq!(catalog.get(created.id).unwrap(), created);
        assert_eq!(catalog.list().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_name_ignores_case() {
        let catalog = MedicationCatalog::new(Arc::new(InMemoryDirectory::new()));
        catalog.create(&ibuprofen()).unwrap();
        let mut shouting = ibuprofen();
        shouting.name = Some("IBUPROFEN".into());
        assert_eq!(catalog.create(&shouting), Err(name_taken("IBUPROFEN")));
    }

    #[test]
    fn update_is_partial_and_checks_names() {
        let catalog = MedicationCatalog::new(Arc::new(InMemoryDirectory::new()));
        let first = catalog.create(&ibuprofen()).unwrap();
        let mut other = ibuprofen();
        other.name = Some("Naproxen".into());
        let second = catalog.create(&other).unwrap();

        let renamed = catalog
            .update(first.id, &request(json!({ "dosage": "200 mg" })))
            .unwrap();
        assert_eq!(renamed.dosage, "200 mg");
        assert_eq!(renamed.name, "Ibuprofen");

        assert!(matches!(
            catalog.update(second.id, &request(json!({ "name": "ibuprofen" }))),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            catalog.update(first.id, &request(json!({ "medicationType": "POTION" }))),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(
            catalog.update(MedicationId::new(77), &request(json!({}))),
            Err(not_found(MedicationId::new(77)))
        );
    }

    #[test]
    fn referenced_medication_is_kept() {
        let w = world();
        let draft = serde_json::from_value(json!({
            "prescriptionDate": "2025-03-01",
            "prescriptionType": "E_REZEPT",
            "medicine": [{ "name": "Aspirin" }],
            "qrCodes": ["QR-1"],
            "pharmacyCode": "PHARMA0001",
            "prescriptionStatus": "ACTIVE",
        }))
        .unwrap();
        w.workflow.issue(w.doctor, w.patient, &draft).unwrap();

        assert_eq!(
            w.catalog.delete(w.aspirin),
            Err(DomainError::conflict(
                "Cannot delete medicine because it's still used in 1 prescription(s)."
            ))
        );
        assert!(w.catalog.delete(w.voltaren).is_ok());
        assert!(matches!(w.catalog.get(w.voltaren), Err(DomainError::NotFound(_))));
    }
}
