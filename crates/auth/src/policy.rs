//! Static route table: which roles may reach which path prefix.
//!
//! Matching is case-insensitive and segment-aware (`admin` matches `admin` and
//! `admin/...`, never `administrator`). Rules are ordered most specific first and
//! the first match wins.

use crate::{Access, Role};

const ADMINS: &[Role] = &[Role::SuperAdmin, Role::Moderator];

struct Rule {
    prefix: &'static str,
    /// `None` matches every method.
    method: Option<&'static str>,
    access: Access,
}

const RULES: &[Rule] = &[
    Rule { prefix: "auth", method: None, access: Access::Public },
    Rule { prefix: "admin/register", method: Some("POST"), access: Access::BootstrapOrSuperAdmin },
    Rule { prefix: "admin/approve", method: Some("PUT"), access: Access::AnyOf(ADMINS) },
    Rule { prefix: "admin", method: None, access: Access::AnyOf(ADMINS) },
    Rule { prefix: "prescriptions", method: None, access: Access::AnyOf(ADMINS) },
    Rule { prefix: "doctors", method: None, access: Access::AnyOf(&[Role::Doctor]) },
    Rule { prefix: "pharmacists", method: None, access: Access::AnyOf(&[Role::Pharmacist]) },
    Rule { prefix: "patients", method: None, access: Access::AnyOf(&[Role::Patient]) },
];

/// Resolve the access requirement for a request.
pub fn role_for(path: &str, method: &str) -> Access {
    let normalized = path.trim_start_matches('/').to_ascii_lowercase();
    RULES
        .iter()
        .find(|rule| {
            matches_prefix(&normalized, rule.prefix)
                && rule.method.is_none_or(|m| m.eq_ignore_ascii_case(method))
        })
        .map(|rule| rule.access)
        .unwrap_or(Access::Authenticated)
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
