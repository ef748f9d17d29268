//! Shared primitives for the HRM workflow automation engine.
//!
//! Every crate in the workspace speaks in these types: the identities the
//! flows create, the requests the invocation surface accepts, and the tagged
//! failure taxonomy that crosses the orchestrator boundary.

use std::fmt;

use uuid::Uuid;

pub mod failure;
pub mod identity;
pub mod requests;

pub use failure::{ErrorClass, Failure, FailureKind, WorkflowOutcome, GENERIC_INTERNAL_MESSAGE};
pub use identity::{ClaimRequest, ClaimResult, EmployeeIdentity, EmployeeRef, JobDetails, JobField, NewEmployee};
pub use requests::{CreateClaimRequest, CreateEmployeeRequest, JobInfo};

/// Identifies one browser session for the lifetime of a single workflow run.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two business workflows the engine can drive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    CreateEmployee,
    CreateClaim,
}

impl WorkflowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowKind::CreateEmployee => "create_employee",
            WorkflowKind::CreateClaim => "create_claim",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn workflow_kind_labels() {
        assert_eq!(WorkflowKind::CreateEmployee.to_string(), "create_employee");
        assert_eq!(WorkflowKind::CreateClaim.as_str(), "create_claim");
    }
}
