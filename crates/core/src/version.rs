//! Optimistic-concurrency version expectations.

use crate::error::{DomainError, DomainResult};

/// Version expectation for a mutable ledger row.
///
/// A writer that validated against a snapshot passes `Exact(v)` for every
/// row it read; a mismatch at commit time means another writer got there
/// first and the whole validate→apply sequence must be retried.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (single-delta adjustments, migrations).
    Any,
    /// Require the row to be at an exact version.
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
            Err(DomainError::concurrent(format!(
                "version check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
