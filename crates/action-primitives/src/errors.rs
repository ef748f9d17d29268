//! Error types for action primitives

use cdp_adapter::DriverError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// A wait condition was not met within its bound
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// No terminal outcome signal appeared after a submission
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// The application raised its error indicator after a submission
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    /// Element is present but cannot be interacted with
    #[error("Element not clickable: {0}")]
    NotClickable(String),

    /// Driver communication or protocol error
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DriverError> for ActionError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::NotInteractable(what) => ActionError::NotClickable(what),
            other => ActionError::CdpIo(other.to_string()),
        }
    }
}
