//! Application services over one shared [`EntityDirectory`].

pub mod accounts;
pub mod actor;
pub mod admin;
pub mod catalog;
pub mod workflow;

use std::sync::Arc;

use crate::directory::EntityDirectory;

pub use accounts::{AccountService, LoginRequest, registration_message};
pub use actor::ActorBinding;
pub use admin::AdminService;
pub use catalog::MedicationCatalog;
pub use workflow::{PrescriptionDetails, PrescriptionWorkflow, TransitionOutcome};

/// Every service, wired to the same directory.
pub struct Services {
    pub accounts: AccountService,
    pub admin: AdminService,
    pub workflow: PrescriptionWorkflow,
    pub catalog: MedicationCatalog,
    pub actors: ActorBinding,
}

impl Services {
    pub fn new(directory: Arc<dyn EntityDirectory>) -> Self {
        Self {
            accounts: AccountService::new(directory.clone()),
            admin: AdminService::new(directory.clone()),
            workflow: PrescriptionWorkflow::new(directory.clone()),
            catalog: MedicationCatalog::new(directory.clone()),
            actors: ActorBinding::new(directory),
        }
    }
}
