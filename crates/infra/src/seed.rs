//! Starter medication catalog.

use medrx_core::DomainResult;
use medrx_prescriptions::{MedicationType, NewMedication};

use crate::directory::EntityDirectory;

const STARTER_CATALOG: &[(&str, &str, &str, MedicationType)] = &[
    ("Aspirin", "Pain relief", "1 pill per day", MedicationType::Pill),
    (
        "Paracetamol",
        "Reduce headache and fever",
        "2 pills every 6 hours",
        MedicationType::Pill,
    ),
    (
        "Voltaren",
        "Relieve muscle and joint stiffness pain",
        "1 pea-sized per affected area",
        MedicationType::Cream,
    ),
    (
        "Quetiapine",
        "treat mental conditions including bipolar, schizophrenia",
        "50 mg per day",
        MedicationType::Pill,
    ),
];

/// Insert the starter entries that are not in the catalog yet.
/// Returns how many were added.
pub fn seed_catalog(directory: &dyn EntityDirectory) -> DomainResult<usize> {
    let mut added = 0;
    for &(name, description, dosage, medication_type) in STARTER_CATALOG {
        if directory.find_medication_by_name_ignore_case(name)?.is_some() {
            continue;
        }
        directory.insert_medication(NewMedication {
            name: name.to_string(),
            description: description.to_string(),
            dosage: dosage.to_string(),
            medication_type,
        })?;
        added += 1;
    }
    tracing::info!(added, "medication catalog seeded");
    Ok(added)
}
