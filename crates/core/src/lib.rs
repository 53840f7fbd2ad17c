//! `medrx-core`: domain foundation building blocks.
//!
//! Identifiers, the error model, lenient enum parsing and version checks; no IO.

pub mod error;
pub mod id;
pub mod sentinel;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::{MedicationId, PersonId, PrescriptionId};
pub use sentinel::{Sentinel, allowed_values, deserialize_or_sentinel, parse_or_sentinel};
pub use version::ExpectedVersion;
