//! `medrx-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows about
//! roles, token claims, password hashes and the route policy, nothing else.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{
    Access, AuthorizationExplanation, AuthzError, authorize, can_register_admin,
    explain_authorization,
};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, PasswordHash};
pub use policy::role_for;
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
pub use token::{Hs256Jwt, JwtValidator, TokenError};
