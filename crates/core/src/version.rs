//! Optimistic concurrency for mutable records.

use crate::error::{DomainError, DomainResult};

/// Version expectation supplied with a compare-and-set update.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "record was modified concurrently (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_everything() {
        assert!(ExpectedVersion::Any.matches(0));
        assert!(ExpectedVersion::Any.matches(17));
    }

    #[test]
    fn exact_mismatch_is_conflict() {
        assert!(ExpectedVersion::Exact(2).check(2).is_ok());
        assert!(matches!(
            ExpectedVersion::Exact(1).check(2),
            Err(DomainError::Conflict(_))
        ));
    }
}
