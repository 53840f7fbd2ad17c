//! Medication catalog entries.

use serde::{Deserialize, Serialize};

use medrx_core::{DomainError, DomainResult, MedicationId, Sentinel, allowed_values, deserialize_or_sentinel};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MedicationType {
    Pill,
    Capsule,
    Cream,
    Syrup,
    Injection,
    Drops,
    Inhaler,
    None,
}

impl Sentinel for MedicationType {
    const SENTINEL: Self = MedicationType::None;
    const VARIANTS: &'static [Self] = &[
        MedicationType::Pill,
        MedicationType::Capsule,
        MedicationType::Cream,
        MedicationType::Syrup,
        MedicationType::Injection,
        MedicationType::Drops,
        MedicationType::Inhaler,
    ];

    fn name(self) -> &'static str {
        match self {
            MedicationType::Pill => "PILL",
            MedicationType::Capsule => "CAPSULE",
            MedicationType::Cream => "CREAM",
            MedicationType::Syrup => "SYRUP",
            MedicationType::Injection => "INJECTION",
            MedicationType::Drops => "DROPS",
            MedicationType::Inhaler => "INHALER",
            MedicationType::None => "NONE",
        }
    }
}

/// A catalog entry. Names are unique, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: MedicationId,
    pub name: String,
    pub description: String,
    pub dosage: String,
    pub medication_type: MedicationType,
}

/// Body for creating or updating a catalog entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub dosage: Option<String>,
    #[serde(default, deserialize_with = "deserialize_or_sentinel")]
    pub medication_type: Option<MedicationType>,
}

/// Validated fields of a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedication {
    pub name: String,
    pub description: String,
    pub dosage: String,
    pub medication_type: MedicationType,
}

impl NewMedication {
    pub fn with_id(self, id: MedicationId) -> Medication {
        Medication {
            id,
            name: self.name,
            description: self.description,
            dosage: self.dosage,
            medication_type: self.medication_type,
        }
    }
}

fn type_not_allowed() -> DomainError {
    DomainError::validation(format!(
        "Medication Type not allowed. Allowed values: {}",
        allowed_values::<MedicationType>()
    ))
}

fn required(value: Option<&str>, label: &str) -> DomainResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::validation(format!("{label} of medicine cannot be empty."))),
    }
}

impl MedicationRequest {
    /// Validate a create request. Fails on the first problem.
    pub fn validate_new(&self) -> DomainResult<NewMedication> {
        let medication_type = match self.medication_type {
            None => {
                return Err(DomainError::validation(format!(
                    "Medication Type should be provided. Allowed values: {}",
                    allowed_values::<MedicationType>()
                )));
            }
            Some(t) if t.is_sentinel() => return Err(type_not_allowed()),
            Some(t) => t,
        };
        Ok(NewMedication {
            name: required(self.name.as_deref(), "Name")?,
            description: required(self.description.as_deref(), "Description")?,
            dosage: required(self.dosage.as_deref(), "Dosage")?,
            medication_type,
        })
    }

    /// Apply a partial update: absent fields are kept, present ones must be valid.
    pub fn apply_to(&self, current: &Medication) -> DomainResult<Medication> {
        let mut updated = current.clone();
        if let Some(t) = self.medication_type {
            if t.is_sentinel() {
                return Err(type_not_allowed());
            }
            updated.medication_type = t;
        }
        if self.name.is_some() {
            updated.name = required(self.name.as_deref(), "Name")?;
        }
        if self.description.is_some() {
            updated.description = required(self.description.as_deref(), "Description")?;
        }
        if self.dosage.is_some() {
            updated.dosage = required(self.dosage.as_deref(), "Dosage")?;
        }
        Ok(updated)
    }
}
