//! Account approval: `Unapproved --approve()--> Approved`, no way back.

use serde::Serialize;

use crate::person::Person;

/// Result of approving an account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved,
    /// Benign no-op: the account could already authenticate.
    AlreadyApproved,
}

impl ApprovalOutcome {
    pub fn message(self) -> &'static str {
        match self {
            ApprovalOutcome::Approved => "User approved successfully",
            ApprovalOutcome::AlreadyApproved => "User is already approved.",
        }
    }
}

impl Person {
    pub fn approve(&mut self) -> ApprovalOutcome {
        if self.approved {
            ApprovalOutcome::AlreadyApproved
        } else {
            self.approved = true;
            ApprovalOutcome::Approved
        }
    }
}
