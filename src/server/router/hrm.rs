use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use hrm_core_types::{CreateClaimRequest, CreateEmployeeRequest, WorkflowOutcome};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::errors::{ApiError, Envelope};
use crate::server::ServeState;

pub(crate) fn router() -> Router<ServeState> {
    Router::new()
        .route("/api/hrm/employees", post(create_employee_handler))
        .route("/api/hrm/claims", post(create_claim_handler))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeCreated {
    employee_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimCreated {
    reference_id: String,
}

#[instrument(name = "http_create_employee", skip_all)]
async fn create_employee_handler(
    State(state): State<ServeState>,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return malformed(rejection),
    };
    match state.orchestrator.create_employee(request).await {
        WorkflowOutcome::Success(employee_id) => {
            Json(Envelope::ok(EmployeeCreated { employee_id })).into_response()
        }
        WorkflowOutcome::Failure(failure) => ApiError::from(&failure).into_response(),
    }
}

#[instrument(name = "http_create_claim", skip_all)]
async fn create_claim_handler(
    State(state): State<ServeState>,
    payload: Result<Json<CreateClaimRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return malformed(rejection),
    };
    match state.orchestrator.create_claim(request).await {
        WorkflowOutcome::Success(result) => Json(Envelope::ok(ClaimCreated {
            reference_id: result.reference_id,
        }))
        .into_response(),
        WorkflowOutcome::Failure(failure) => ApiError::from(&failure).into_response(),
    }
}

fn malformed(rejection: JsonRejection) -> Response {
    debug!(error = %rejection, "rejected request body");
    ApiError::bad_request(rejection.body_text()).into_response()
}
