//! Failure taxonomy and the tagged outcome returned across the orchestrator boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message substituted for every internal-class failure shown to callers.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

/// Internal failure categories. Every failure path inside a flow lands in one of these.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The identity store already holds an employee with the same name.
    DuplicateIdentity,
    /// An id or name supplied by the caller could not be resolved upstream.
    FieldNotFound,
    /// No dropdown option matched the requested label.
    DropdownOptionNotFound { field: String, label: String },
    /// The typeahead produced no candidate for the display name.
    SuggestionNotFound { name: String },
    /// The error indicator fired after a submission.
    SubmissionError,
    /// No terminal signal appeared within the bound.
    NavigationTimeout,
    /// The confirmation surface carried no reference id.
    ReferenceIdMissing,
    /// The injected candidate id did not read back unchanged.
    IdMismatch { expected: String, actual: String },
    /// The request failed validation before any session was launched.
    InvalidRequest,
    /// Anything unanticipated.
    Internal,
}

impl FailureKind {
    /// Total mapping onto the three classes exposed to callers.
    pub fn class(&self) -> ErrorClass {
        match self {
            FailureKind::DuplicateIdentity => ErrorClass::Conflict,
            FailureKind::FieldNotFound
            | FailureKind::DropdownOptionNotFound { .. }
            | FailureKind::SuggestionNotFound { .. }
            | FailureKind::InvalidRequest => ErrorClass::NotFound,
            FailureKind::SubmissionError
            | FailureKind::NavigationTimeout
            | FailureKind::ReferenceIdMissing
            | FailureKind::IdMismatch { .. }
            | FailureKind::Internal => ErrorClass::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::DuplicateIdentity => "duplicate_identity",
            FailureKind::FieldNotFound => "field_not_found",
            FailureKind::DropdownOptionNotFound { .. } => "dropdown_option_not_found",
            FailureKind::SuggestionNotFound { .. } => "suggestion_not_found",
            FailureKind::SubmissionError => "submission_error",
            FailureKind::NavigationTimeout => "navigation_timeout",
            FailureKind::ReferenceIdMissing => "reference_id_missing",
            FailureKind::IdMismatch { .. } => "id_mismatch",
            FailureKind::InvalidRequest => "invalid_request",
            FailureKind::Internal => "internal",
        }
    }
}

/// Upward error classes. Not-found also covers bad requests.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Conflict,
    NotFound,
    Internal,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Conflict => "conflict",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Internal => "internal",
        }
    }
}

/// A typed failure with a human-readable message.
#[derive(Clone, Debug, Eq, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn duplicate_identity() -> Self {
        Self::new(
            FailureKind::DuplicateIdentity,
            "Employee with the same name already exists",
        )
    }

    pub fn field_not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::FieldNotFound, message)
    }

    pub fn dropdown_option_not_found(field: impl Into<String>, label: impl Into<String>) -> Self {
        let field = field.into();
        let label = label.into();
        let message = format!("{field} '{label}' not found");
        Self::new(FailureKind::DropdownOptionNotFound { field, label }, message)
    }

    pub fn suggestion_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        let message = format!("Employee '{name}' not found in suggestions");
        Self::new(FailureKind::SuggestionNotFound { name }, message)
    }

    pub fn submission_failed(what: &str) -> Self {
        Self::new(
            FailureKind::SubmissionError,
            format!("{what} submission failed"),
        )
    }

    pub fn navigation_timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NavigationTimeout, message)
    }

    pub fn reference_id_missing() -> Self {
        Self::new(
            FailureKind::ReferenceIdMissing,
            "Could not extract reference ID from confirmation page",
        )
    }

    pub fn id_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        let expected = expected.into();
        let actual = actual.into();
        let message = format!("Employee ID mismatch: expected {expected}, got {actual}");
        Self::new(FailureKind::IdMismatch { expected, actual }, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Message safe to hand to callers; internal details never leak.
    pub fn public_message(&self) -> &str {
        match self.class() {
            ErrorClass::Internal => GENERIC_INTERNAL_MESSAGE,
            ErrorClass::Conflict | ErrorClass::NotFound => &self.message,
        }
    }
}

/// Tagged result of one workflow run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum WorkflowOutcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> WorkflowOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Success(_))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            WorkflowOutcome::Success(_) => None,
            WorkflowOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            WorkflowOutcome::Success(value) => Ok(value),
            WorkflowOutcome::Failure(failure) => Err(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WorkflowOutcome<U> {
        match self {
            WorkflowOutcome::Success(value) => WorkflowOutcome::Success(f(value)),
            WorkflowOutcome::Failure(failure) => WorkflowOutcome::Failure(failure),
        }
    }

    /// Outcome label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowOutcome::Success(_) => "success",
            WorkflowOutcome::Failure(failure) => failure.class().as_str(),
        }
    }
}

impl<T> From<Result<T, Failure>> for WorkflowOutcome<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => WorkflowOutcome::Success(value),
            Err(failure) => WorkflowOutcome::Failure(failure),
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_kind() -> Vec<FailureKind> {
        vec![
            FailureKind::DuplicateIdentity,
            FailureKind::FieldNotFound,
            FailureKind::DropdownOptionNotFound {
                field: "Currency".into(),
                label: "Euro".into(),
            },
            FailureKind::SuggestionNotFound {
                name: "Jane Doe".into(),
            },
            FailureKind::SubmissionError,
            FailureKind::NavigationTimeout,
            FailureKind::ReferenceIdMissing,
            FailureKind::IdMismatch {
                expected: "a".into(),
                actual: "b".into(),
            },
            FailureKind::InvalidRequest,
            FailureKind::Internal,
        ]
    }

    #[test]
    fn upward_mapping_covers_every_kind() {
        let classes: Vec<_> = every_kind().iter().map(FailureKind::class).collect();
        assert_eq!(
            classes,
            vec![
                ErrorClass::Conflict,
                ErrorClass::NotFound,
                ErrorClass::NotFound,
                ErrorClass::NotFound,
                ErrorClass::Internal,
                ErrorClass::Internal,
                ErrorClass::Internal,
                ErrorClass::Internal,
                ErrorClass::NotFound,
                ErrorClass::Internal,
            ]
        );
    }

    #[test]
    fn internal_messages_are_not_leaked() {
        let failure = Failure::navigation_timeout("claim details page never loaded: .oxd-dialog");
        assert_eq!(failure.public_message(), GENERIC_INTERNAL_MESSAGE);

        let failure = Failure::id_mismatch("ABC1234", "0042");
        assert_eq!(failure.public_message(), GENERIC_INTERNAL_MESSAGE);
    }

    #[test]
    fn dropdown_failure_names_field_and_label() {
        let failure = Failure::dropdown_option_not_found("Currency", "Euro");
        assert_eq!(failure.message, "Currency 'Euro' not found");
        assert_eq!(failure.public_message(), "Currency 'Euro' not found");
        assert_eq!(
            failure.kind,
            FailureKind::DropdownOptionNotFound {
                field: "Currency".into(),
                label: "Euro".into()
            }
        );
    }

    #[test]
    fn outcome_converts_from_result() {
        let ok: WorkflowOutcome<u32> = Ok::<_, Failure>(7).into();
        assert!(ok.is_success());
        assert_eq!(ok.label(), "success");

        let err: WorkflowOutcome<u32> = Err(Failure::duplicate_identity()).into();
        assert_eq!(err.label(), "conflict");
        assert_eq!(
            err.into_result().unwrap_err().kind,
            FailureKind::DuplicateIdentity
        );
    }

    #[test]
    fn outcome_serializes_tagged() {
        let outcome: WorkflowOutcome<String> = WorkflowOutcome::Success("0042".into());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["value"], "0042");
    }
}
