//! `medrx-prescriptions`: medication catalog and prescription lifecycle (pure domain).

pub mod draft;
pub mod medication;
pub mod prescription;

pub use draft::{CheckedDraft, MedicationRef, PrescriptionDraft};
pub use medication::{Medication, MedicationRequest, MedicationType, NewMedication};
pub use prescription::{Prescription, PrescriptionStatus, PrescriptionType, Transition};
