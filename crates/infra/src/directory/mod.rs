//! Entity directory: accounts, medication catalog and prescriptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryDirectory;
pub use r#trait::{
    AdminGuard, DirectoryError, DirectoryResult, EntityDirectory, NewAccount, NewPrescription,
    PrescriptionFilter, UniqueKey,
};
