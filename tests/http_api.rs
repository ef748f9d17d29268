use std::sync::Arc;

use action_flow::testing::{FakeHrmSite, SiteOptions, BASE_URL};
use action_flow::SequenceIdCandidates;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use cdp_adapter::scripted::ScriptedLauncher;
use cdp_adapter::{DriverError, SessionConfig, SessionLauncher};
use chrono::NaiveDate;
use hrm_autopilot::config::TargetConfig;
use hrm_autopilot::{build_router, FixedClock, ServeState, WorkflowOrchestrator};
use hrm_core_types::NewEmployee;
use identity_store::{IdentityStore, InMemoryIdentityStore};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    router: Router,
    state: ServeState,
    launcher: Arc<ScriptedLauncher>,
    store: Arc<InMemoryIdentityStore>,
}

fn harness_with(site: &FakeHrmSite, launcher: Arc<ScriptedLauncher>) -> Harness {
    let store = Arc::new(InMemoryIdentityStore::new());
    let orchestrator = WorkflowOrchestrator::new(
        launcher.clone() as Arc<dyn SessionLauncher>,
        site.kit(),
        SessionConfig::default(),
        TargetConfig {
            base_url: BASE_URL.to_string(),
            ..TargetConfig::default()
        },
    )
    .with_store(store.clone())
    .with_ids(Arc::new(SequenceIdCandidates::new(["A1b2C3d"])))
    .with_clock(Arc::new(FixedClock(
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
    )));
    let state = ServeState::new(Arc::new(orchestrator));
    Harness {
        router: build_router(state.clone()),
        state,
        launcher,
        store,
    }
}

fn harness(site: &FakeHrmSite) -> Harness {
    harness_with(site, Arc::new(site.launcher()))
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn employee_body() -> Value {
    json!({
        "firstName": "Peter",
        "middleName": "Lowenbrau",
        "lastName": "Griffin",
        "job": {
            "jobTitle": "QA Engineer",
            "jobCategory": "Professionals",
            "subUnit": "Engineering",
            "location": "Texas R&D",
            "employmentStatus": "Full-Time Permanent"
        }
    })
}

#[tokio::test]
async fn create_employee_returns_the_id() {
    let site = FakeHrmSite::new();
    let h = harness(&site);

    let (status, body) = post(&h.router, "/api/hrm/employees", employee_body()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": {"employeeId": "42"}}));
    assert!(h.store.exists("42").await.unwrap());
}

#[tokio::test]
async fn duplicate_employee_is_409() {
    let site = FakeHrmSite::new();
    let h = harness(&site);
    h.store
        .add(
            NewEmployee::new("Peter", "Griffin")
                .with_middle_name("Lowenbrau")
                .into_identity("0007"),
        )
        .await
        .unwrap();

    let (status, body) = post(&h.router, "/api/hrm/employees", employee_body()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorMessage"], "Employee with the same name already exists");
    assert_eq!(h.launcher.launches(), 0);
}

#[tokio::test]
async fn missing_last_name_is_400_without_a_browser() {
    let site = FakeHrmSite::new();
    let h = harness(&site);
    let mut body = employee_body();
    body["lastName"] = json!("  ");

    let (status, body) = post(&h.router, "/api/hrm/employees", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorMessage"], "FirstName and LastName are required");
    assert_eq!(h.launcher.launches(), 0);
}

#[tokio::test]
async fn malformed_json_is_400_with_envelope() {
    let site = FakeHrmSite::new();
    let h = harness(&site);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/hrm/claims")
        .header("content-type", "application/json")
        .body(Body::from("{\"event\": "))
        .unwrap();

    let (status, body) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["errorMessage"].is_string());
}

#[tokio::test]
async fn claim_with_unknown_event_is_400() {
    let site = FakeHrmSite::new();
    let h = harness(&site);

    let (status, body) = post(
        &h.router,
        "/api/hrm/claims",
        json!({
            "employeeName": "Peter Lowenbrau Griffin",
            "event": "Relocation",
            "currency": "Euro"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorMessage"], "Event 'Relocation' not found");
}

#[tokio::test]
async fn claim_returns_reference_id() {
    let site = FakeHrmSite::build(SiteOptions {
        directory: vec!["Jane Doe".to_string()],
        ..SiteOptions::default()
    });
    let h = harness(&site);
    h.store
        .add(NewEmployee::new("Jane", "Doe").into_identity("0042"))
        .await
        .unwrap();

    let (status, body) = post(
        &h.router,
        "/api/hrm/claims",
        json!({
            "employeeId": "0042",
            "event": "Travel Allowance",
            "currency": "Euro",
            "remarks": "Quarterly offsite"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["referenceId"], "202610170000012");
    assert_eq!(site.remarks(), "Quarterly offsite");
}

#[tokio::test]
async fn browser_failure_is_500_with_generic_message() {
    let site = FakeHrmSite::new();
    let launcher = Arc::new(ScriptedLauncher::failing(DriverError::Launch(
        "chrome not found at /opt/chrome".to_string(),
    )));
    let h = harness_with(&site, launcher);

    let (status, body) = post(&h.router, "/api/hrm/employees", employee_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "errorMessage": "Internal server error"})
    );
}

#[tokio::test]
async fn readiness_follows_health_state() {
    let site = FakeHrmSite::new();
    let h = harness(&site);
    let get = |uri: &str| {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&h.router, get("/readyz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    h.state.mark_live();
    h.state.mark_ready();
    let (status, body) = send(&h.router, get("/readyz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    let (status, body) = send(&h.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "scripted");
    assert_eq!(body["id_lookup"], true);

    h.state.mark_unready("shutting down");
    let (status, body) = send(&h.router, get("/readyz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);
    assert_eq!(body["last_error"], "shutting down");
}

#[tokio::test]
async fn metrics_endpoint_exposes_workflow_counters() {
    let site = FakeHrmSite::new();
    let h = harness(&site);
    let mut body = employee_body();
    body["firstName"] = json!("");
    post(&h.router, "/api/hrm/employees", body).await;

    let response = h
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    assert!(text.contains("hrm_workflow_runs_total"));
    assert!(text.contains("workflow=\"create_employee\""));
}
