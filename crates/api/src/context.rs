use medrx_auth::{Principal, Role};

/// Authenticated caller of a request, decoded from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn roles(&self) -> &[Role] {
        &self.principal.roles
    }
}

/// A bearer token was sent but could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub reason: String,
}

/// Correlation id of a request (`x-request-id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);
