//! Entity trait: identity + versioned continuity across replacements.
//!
//! Workflow entities are immutable-by-replacement: every mutation returns a
//! new value whose `version` is one higher and whose `updated_at` is the
//! mutation time. Storage uses the version for optimistic concurrency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Monotonically increasing version of the entity's state.
    fn version(&self) -> u64;

    /// Lifecycle timestamps.
    fn timestamps(&self) -> &Timestamps;
}

/// Lifecycle timestamps shared by every entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Timestamps {
    pub fn created(at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            updated_at: at,
            confirmed_at: None,
            finalized_at: None,
        }
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    pub fn confirm(&mut self, at: DateTime<Utc>) {
        self.confirmed_at = Some(at);
        self.updated_at = at;
    }

    pub fn finalize(&mut self, at: DateTime<Utc>) {
        self.finalized_at = Some(at);
        self.updated_at = at;
    }
}

/// Optimistic concurrency expectation for a save.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (seeding, migrations).
    Any,
    /// The entity must not exist yet.
    New,
    /// Require the stored entity to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// `stored` is `None` when no entity exists under the id.
    pub fn matches(self, stored: Option<u64>) -> bool {
        match (self, stored) {
            (ExpectedVersion::Any, _) => true,
            (ExpectedVersion::New, None) => true,
            (ExpectedVersion::Exact(v), Some(actual)) => v == actual,
            _ => false,
        }
    }

    pub fn check(self, stored: Option<u64>) -> DomainResult<()> {
        if self.matches(stored) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {stored:?})"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_version_matrix() {
        assert!(ExpectedVersion::Any.matches(None));
        assert!(ExpectedVersion::Any.matches(Some(3)));
        assert!(ExpectedVersion::New.matches(None));
        assert!(!ExpectedVersion::New.matches(Some(1)));
        assert!(ExpectedVersion::Exact(2).matches(Some(2)));
        assert!(!ExpectedVersion::Exact(2).matches(Some(3)));
        assert!(!ExpectedVersion::Exact(2).matches(None));
        assert!(matches!(
            ExpectedVersion::Exact(1).check(Some(2)),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn timestamps_stamp_and_touch() {
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let t1 = DateTime::from_timestamp(1_700_000_100, 0).unwrap();
        let mut ts = Timestamps::created(t0);
        ts.confirm(t1);
        assert_eq!(ts.created_at, t0);
        assert_eq!(ts.updated_at, t1);
        assert_eq!(ts.confirmed_at, Some(t1));
        assert_eq!(ts.finalized_at, None);
    }
}
