//! Infrastructure layer: the entity directory, application services and
//! catalog seeding.

pub mod directory;
pub mod seed;
pub mod services;


pub use directory::{EntityDirectory, InMemoryDirectory};
pub use services::Services;
