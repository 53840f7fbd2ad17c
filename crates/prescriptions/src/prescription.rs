//! Prescription record and its status state machine.
//!
//! ```text
//! ACTIVE --cancel (issuing doctor)------> CANCELED   (terminal)
//! ACTIVE --fulfill (matching pharmacy)--> FULFILLED  (terminal)
//! ```
//!
//! EXPIRED is reserved and never entered. NONEXISTENT is the sentinel for
//! malformed input and is never persisted.

use chrono::NaiveDate;
use serde::Serialize;

use medrx_core::{DomainError, DomainResult, MedicationId, PersonId, PrescriptionId, Sentinel};

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    Active,
    Canceled,
    Expired,
    Fulfilled,
    Nonexistent,
}

impl Sentinel for PrescriptionStatus {
    const SENTINEL: Self = PrescriptionStatus::Nonexistent;
    const VARIANTS: &'static [Self] = &[
        PrescriptionStatus::Active,
        PrescriptionStatus::Canceled,
        PrescriptionStatus::Expired,
        PrescriptionStatus::Fulfilled,
    ];

    fn name(self) -> &'static str {
        match self {
            PrescriptionStatus::Active => "ACTIVE",
            PrescriptionStatus::Canceled => "CANCELED",
            PrescriptionStatus::Expired => "EXPIRED",
            PrescriptionStatus::Fulfilled => "FULFILLED",
            PrescriptionStatus::Nonexistent => "NONEXISTENT",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum PrescriptionType {
    #[serde(rename = "E_REZEPT")]
    ERezept,
    #[serde(rename = "PRIVAT")]
    Privat,
    #[serde(rename = "NONE")]
    None,
}

impl Sentinel for PrescriptionType {
    const SENTINEL: Self = PrescriptionType::None;
    const VARIANTS: &'static [Self] = &[PrescriptionType::ERezept, PrescriptionType::Privat];

    fn name(self) -> &'static str {
        match self {
            PrescriptionType::ERezept => "E_REZEPT",
            PrescriptionType::Privat => "PRIVAT",
            PrescriptionType::None => "NONE",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transitions
// ─────────────────────────────────────────────────────────────────────────────

/// What a requested transition does to a prescription in a given status.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Move to the given status.
    To(PrescriptionStatus),
    /// Already in the requested end state; nothing to write.
    Unchanged,
}

impl PrescriptionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PrescriptionStatus::Canceled | PrescriptionStatus::Fulfilled)
    }

    /// Cancellation by the issuing doctor. Re-cancelling is a no-op.
    pub fn cancel(self) -> DomainResult<Transition> {
        match self {
            PrescriptionStatus::Active => Ok(Transition::To(PrescriptionStatus::Canceled)),
            PrescriptionStatus::Canceled => Ok(Transition::Unchanged),
            PrescriptionStatus::Fulfilled => Err(DomainError::conflict(
                "Prescription is already fulfilled and cannot be cancelled.",
            )),
            other => Err(DomainError::conflict(format!(
                "Prescription with status {} cannot be cancelled.",
                other.name()
            ))),
        }
    }

    /// Fulfillment by the pharmacy named on the prescription. Only ACTIVE qualifies.
    pub fn fulfill(self) -> DomainResult<Transition> {
        match self {
            PrescriptionStatus::Active => Ok(Transition::To(PrescriptionStatus::Fulfilled)),
            PrescriptionStatus::Fulfilled => {
                Err(DomainError::conflict("Prescription is already fulfilled."))
            }
            other => Err(DomainError::conflict(format!(
                "Prescription with status {} cannot be fulfilled.",
                other.name()
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Prescription
// ─────────────────────────────────────────────────────────────────────────────

/// A stored prescription.
///
/// # Invariants
/// - `medicine` is non-empty and holds catalog ids, never client payload.
/// - `pharmacy_code` named an existing pharmacist at creation.
/// - `version` grows by one on every status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: PrescriptionId,
    pub patient_id: PersonId,
    pub doctor_id: PersonId,
    pub prescription_date: NaiveDate,
    pub prescription_type: PrescriptionType,
    pub medicine: Vec<MedicationId>,
    pub qr_codes: Vec<String>,
    pub pharmacy_code: String,
    pub prescription_status: PrescriptionStatus,
    pub version: u64,
}

impl Prescription {
    pub const INITIAL_VERSION: u64 = 1;

    pub fn references(&self, medication: MedicationId) -> bool {
        self.medicine.contains(&medication)
    }

    /// Set a new status, bumping the version.
    pub fn apply(&mut self, status: PrescriptionStatus) {
        self.prescription_status = status;
        self.version += 1;
    }
}
