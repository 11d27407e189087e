//! Run identity for correlating one pipeline execution.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies the owner of a piece of execution state.
///
/// Every run gets a fresh `run_id`; nested scopes keep the run id and get a new
/// `scope_id`, so stages that coordinate on shared state can tell whether two
/// states belong to the same run or the same scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunIdentity {
    /// The unique ID for this run.
    pub run_id: Uuid,
    /// The unique ID for the current resource scope.
    pub scope_id: Uuid,
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl RunIdentity {
    /// Creates a new identity for a fresh run.
    #[must_use]
    pub fn new() -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            scope_id: run_id,
        }
    }

    /// Creates an identity with a specific run ID.
    #[must_use]
    pub fn with_run_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            scope_id: run_id,
        }
    }

    /// Returns an identity for a nested scope of the same run.
    #[must_use]
    pub fn nested(&self) -> Self {
        Self {
            run_id: self.run_id,
            scope_id: Uuid::new_v4(),
        }
    }

    /// Returns true if this identity is the root scope of its run.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.run_id == self.scope_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identity_is_root() {
        let identity = RunIdentity::new();
        assert!(identity.is_root());
    }

    #[test]
    fn test_nested_keeps_run_id() {
        let identity = RunIdentity::new();
        let nested = identity.nested();

        assert_eq!(nested.run_id, identity.run_id);
        assert_ne!(nested.scope_id, identity.scope_id);
        assert!(!nested.is_root());
    }

    #[test]
    fn test_identity_serialization() {
        let identity = RunIdentity::new().nested();
        let json = serde_json::to_string(&identity).unwrap();
        let deserialized: RunIdentity = serde_json::from_str(&json).unwrap();

        assert_eq!(identity, deserialized);
    }
}
