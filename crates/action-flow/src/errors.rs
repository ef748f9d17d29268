//! Flow execution error types

use action_primitives::ActionError;
use hrm_core_types::Failure;
use thiserror::Error;

/// Flow execution errors. Every variant folds into a typed [`Failure`] at
/// the flow boundary.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A UI step failed for a reason the taxonomy has no specific kind for
    #[error("{step}: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: ActionError,
    },

    /// A classified failure
    #[error(transparent)]
    Failure(#[from] Failure),
}

impl From<FlowError> for Failure {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Failure(failure) => failure,
            step @ FlowError::Step { .. } => Failure::internal(step.to_string()),
        }
    }
}

/// Attaches the name of the step that was running to a primitive error.
pub(crate) trait StepExt<T> {
    fn step(self, step: &'static str) -> Result<T, FlowError>;
}

impl<T, E> StepExt<T> for Result<T, E>
where
    E: Into<ActionError>,
{
    fn step(self, step: &'static str) -> Result<T, FlowError> {
        self.map_err(|err| FlowError::Step {
            step,
            source: err.into(),
        })
    }
}

/// Classifies an outcome-detection error for the submission of `what`.
pub(crate) fn outcome_failure(err: ActionError, what: &str, timeout_message: &str) -> FlowError {
    match err {
        ActionError::SubmissionFailed(_) => Failure::submission_failed(what).into(),
        ActionError::NavTimeout(_) => Failure::navigation_timeout(timeout_message).into(),
        other => FlowError::Step {
            step: "await submission outcome",
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrm_core_types::{ErrorClass, FailureKind};

    #[test]
    fn step_errors_become_internal_failures() {
        let err: Result<(), ActionError> = Err(ActionError::WaitTimeout("visible(css=h6)".into()));
        let failure = Failure::from(err.step("await dashboard").unwrap_err());
        assert_eq!(failure.kind, FailureKind::Internal);
        assert!(failure.message.starts_with("await dashboard"));
        assert_eq!(failure.class(), ErrorClass::Internal);
    }

    #[test]
    fn outcome_errors_keep_their_kind() {
        let failure = Failure::from(outcome_failure(
            ActionError::SubmissionFailed("claim".into()),
            "Claim",
            "unused",
        ));
        assert_eq!(failure.kind, FailureKind::SubmissionError);
        assert_eq!(failure.message, "Claim submission failed");

        let failure = Failure::from(outcome_failure(
            ActionError::NavTimeout("claim".into()),
            "Claim",
            "Failed to navigate to claim details page",
        ));
        assert_eq!(failure.kind, FailureKind::NavigationTimeout);
        assert_eq!(failure.message, "Failed to navigate to claim details page");
    }
}
