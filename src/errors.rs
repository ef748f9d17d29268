//! HTTP mapping of workflow failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hrm_core_types::{ErrorClass, Failure};
use serde::Serialize;

/// Response envelope shared by every workflow route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_message: None,
        }
    }
}

impl Envelope<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<&Failure> for ApiError {
    fn from(failure: &Failure) -> Self {
        let status = match failure.class() {
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::NotFound => StatusCode::BAD_REQUEST,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: failure.public_message().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(Envelope::error(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrm_core_types::GENERIC_INTERNAL_MESSAGE;

    #[test]
    fn failure_classes_map_to_statuses() {
        let conflict = ApiError::from(&Failure::duplicate_identity());
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.message, "Employee with the same name already exists");

        let missing = ApiError::from(&Failure::dropdown_option_not_found("Location", "Quahog"));
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
        assert_eq!(missing.message, "Location 'Quahog' not found");

        let internal = ApiError::from(&Failure::internal("cdp socket closed"));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, GENERIC_INTERNAL_MESSAGE);
    }

    #[test]
    fn error_envelope_omits_data() {
        let body = serde_json::to_value(Envelope::error("nope")).unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "errorMessage": "nope"}));
    }
}
