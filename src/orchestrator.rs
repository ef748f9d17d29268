//! Runs one business workflow end to end.
//!
//! Each run owns a fresh browser session: validate, consult the identity
//! store, launch, log in, drive the flow, release the browser, persist. The
//! browser is released on every path, including a panic inside a flow.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use action_flow::{
    ClaimCreationFlow, EmployeeCreationFlow, FlowKit, IdCandidateSource, LoginFlow,
    RandomIdCandidates,
};
use cdp_adapter::{BrowserDriver, BrowserSession, SessionConfig, SessionLauncher};
use chrono::NaiveDate;
use futures::FutureExt;
use hrm_core_types::{
    ClaimRequest, ClaimResult, CreateClaimRequest, CreateEmployeeRequest, EmployeeIdentity,
    EmployeeRef, Failure, JobDetails, NewEmployee, WorkflowKind, WorkflowOutcome,
};
use identity_store::IdentityStore;
use tracing::{error, info, instrument, warn};

use crate::config::{AppConfig, TargetConfig};
use crate::metrics;

/// Source of the employee join date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub struct WorkflowOrchestrator {
    launcher: Arc<dyn SessionLauncher>,
    store: Option<Arc<dyn IdentityStore>>,
    ids: Arc<dyn IdCandidateSource>,
    clock: Arc<dyn Clock>,
    kit: FlowKit,
    session: SessionConfig,
    target: TargetConfig,
    allow_duplicates: bool,
}

impl WorkflowOrchestrator {
    pub fn new(
        launcher: Arc<dyn SessionLauncher>,
        kit: FlowKit,
        session: SessionConfig,
        target: TargetConfig,
    ) -> Self {
        Self {
            launcher,
            store: None,
            ids: Arc::new(RandomIdCandidates),
            clock: Arc::new(SystemClock),
            kit,
            session,
            target,
            allow_duplicates: false,
        }
    }

    /// Orchestrator wired from validated configuration.
    pub fn from_config(
        config: &AppConfig,
        launcher: Arc<dyn SessionLauncher>,
        store: Option<Arc<dyn IdentityStore>>,
    ) -> Self {
        let mut orchestrator = Self::new(
            launcher,
            config.flow_kit(),
            config.session_config(),
            config.target.clone(),
        )
        .allow_duplicates(config.workflow.allow_duplicates);
        if let Some(store) = store {
            orchestrator = orchestrator.with_store(store);
        }
        orchestrator
    }

    pub fn with_store(mut self, store: Arc<dyn IdentityStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdCandidateSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    /// True when claims may name the employee by id.
    pub fn id_lookup_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn backend(&self) -> &'static str {
        self.launcher.backend()
    }

    #[instrument(name = "workflow", skip_all, fields(workflow = "create_employee"))]
    pub async fn create_employee(&self, request: CreateEmployeeRequest) -> WorkflowOutcome<String> {
        let started = Instant::now();
        let outcome: WorkflowOutcome<String> = self.run_create_employee(request).await.into();
        finish(WorkflowKind::CreateEmployee, &outcome, started);
        outcome
    }

    #[instrument(name = "workflow", skip_all, fields(workflow = "create_claim"))]
    pub async fn create_claim(&self, request: CreateClaimRequest) -> WorkflowOutcome<ClaimResult> {
        let started = Instant::now();
        let outcome: WorkflowOutcome<ClaimResult> = self.run_create_claim(request).await.into();
        finish(WorkflowKind::CreateClaim, &outcome, started);
        outcome
    }

    async fn run_create_employee(&self, request: CreateEmployeeRequest) -> Result<String, Failure> {
        let (employee, job) = request.into_parts()?;
        self.ensure_not_recorded(&employee).await?;

        let join_date = self.clock.today();
        let session = self.open_session().await?;
        let result = AssertUnwindSafe(self.drive_employee(session.driver(), &employee, &job, join_date))
            .catch_unwind()
            .await;
        session.release().await;
        let employee_id = unwind(result)?;

        self.record(employee.into_identity(employee_id.clone())).await;
        Ok(employee_id)
    }

    async fn run_create_claim(&self, request: CreateClaimRequest) -> Result<ClaimResult, Failure> {
        let claim = request.into_claim(self.id_lookup_available())?;
        let display_name = self.resolve_claimant(&claim).await?;

        let session = self.open_session().await?;
        let result = AssertUnwindSafe(self.drive_claim(session.driver(), &display_name, &claim))
            .catch_unwind()
            .await;
        session.release().await;
        unwind(result)
    }

    /// Rejects a name already in the store, unless duplicates are allowed.
    /// Not atomic with the later insert: two concurrent runs for the same
    /// name can both pass.
    async fn ensure_not_recorded(&self, employee: &NewEmployee) -> Result<(), Failure> {
        if self.allow_duplicates {
            return Ok(());
        }
        let Some(store) = &self.store else {
            return Ok(());
        };
        match store
            .find_by_name(&employee.first_name, employee.middle(), &employee.last_name)
            .await
        {
            Ok(None) => Ok(()),
            Ok(Some(existing)) => {
                warn!(employee_id = %existing.employee_id, "employee already recorded");
                Err(Failure::duplicate_identity())
            }
            Err(err) => Err(Failure::internal(format!("identity lookup failed: {err}"))),
        }
    }

    async fn resolve_claimant(&self, claim: &ClaimRequest) -> Result<String, Failure> {
        let id = match &claim.employee {
            EmployeeRef::Name(name) => return Ok(name.clone()),
            EmployeeRef::Id(id) => id,
        };
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| Failure::invalid_request("Employee lookup by id is not available"))?;
        match store.find_by_id(id).await {
            Ok(Some(identity)) => Ok(identity.display_name()),
            Ok(None) => Err(Failure::field_not_found(format!(
                "Employee with ID '{id}' not found"
            ))),
            Err(err) => Err(Failure::internal(format!("identity lookup failed: {err}"))),
        }
    }

    async fn open_session(&self) -> Result<BrowserSession, Failure> {
        BrowserSession::open(self.launcher.as_ref(), &self.session)
            .await
            .map_err(|err| Failure::internal(format!("failed to start browser: {err}")))
    }

    async fn login(&self, driver: &dyn BrowserDriver) -> Result<(), Failure> {
        LoginFlow::new(&self.kit)
            .login(
                driver,
                &self.target.base_url,
                &self.target.username,
                &self.target.password,
            )
            .await
            .map_err(|failure| Failure::internal(format!("login failed: {}", failure.message)))
    }

    async fn drive_employee(
        &self,
        driver: &dyn BrowserDriver,
        employee: &NewEmployee,
        job: &JobDetails,
        join_date: NaiveDate,
    ) -> Result<String, Failure> {
        self.login(driver).await?;
        EmployeeCreationFlow::new(&self.kit, self.ids.as_ref())
            .create(driver, employee, job, join_date)
            .await
    }

    async fn drive_claim(
        &self,
        driver: &dyn BrowserDriver,
        display_name: &str,
        claim: &ClaimRequest,
    ) -> Result<ClaimResult, Failure> {
        self.login(driver).await?;
        ClaimCreationFlow::new(&self.kit)
            .create(
                driver,
                display_name,
                &claim.event,
                &claim.currency,
                claim.remarks(),
            )
            .await
    }

    /// The employee already exists in the target system at this point, so a
    /// store error is logged and the run still succeeds.
    async fn record(&self, identity: EmployeeIdentity) {
        let Some(store) = &self.store else {
            return;
        };
        let employee_id = identity.employee_id.clone();
        if let Err(err) = store.add(identity).await {
            error!(employee_id = %employee_id, error = %err, "failed to record employee");
        }
    }
}

fn unwind<T>(result: Result<Result<T, Failure>, Box<dyn Any + Send>>) -> Result<T, Failure> {
    match result {
        Ok(outcome) => outcome,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(Failure::internal(format!("workflow panicked: {detail}")))
        }
    }
}

fn finish<T>(kind: WorkflowKind, outcome: &WorkflowOutcome<T>, started: Instant) {
    let elapsed = started.elapsed();
    metrics::record_workflow(kind, outcome.label(), elapsed);
    match outcome.failure() {
        None => info!(
            workflow = kind.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "workflow succeeded"
        ),
        Some(failure) => warn!(
            workflow = kind.as_str(),
            outcome = outcome.label(),
            error = %failure,
            elapsed_ms = elapsed.as_millis() as u64,
            "workflow failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_flow::testing::FakeHrmSite;
    use action_flow::SequenceIdCandidates;
    use hrm_core_types::{ErrorClass, FailureKind};
    use identity_store::InMemoryIdentityStore;

    fn orchestrator(site: &FakeHrmSite, launcher: Arc<dyn SessionLauncher>) -> WorkflowOrchestrator {
        WorkflowOrchestrator::new(
            launcher,
            site.kit(),
            SessionConfig::default(),
            TargetConfig {
                base_url: action_flow::testing::BASE_URL.to_string(),
                ..TargetConfig::default()
            },
        )
        .with_ids(Arc::new(SequenceIdCandidates::new(["0312"])))
        .with_clock(Arc::new(FixedClock(
            NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        )))
    }

    #[tokio::test]
    async fn invalid_request_never_launches() {
        let site = FakeHrmSite::new();
        let launcher = Arc::new(site.launcher());
        let orchestrator = orchestrator(&site, launcher.clone());

        let outcome = orchestrator
            .create_employee(CreateEmployeeRequest::default())
            .await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::InvalidRequest);
        assert_eq!(failure.class(), ErrorClass::NotFound);
        assert_eq!(launcher.launches(), 0);
    }

    #[tokio::test]
    async fn claim_by_unknown_id_is_not_found_before_launch() {
        let site = FakeHrmSite::new();
        let launcher = Arc::new(site.launcher());
        let orchestrator = orchestrator(&site, launcher.clone())
            .with_store(Arc::new(InMemoryIdentityStore::new()));

        let outcome = orchestrator
            .create_claim(CreateClaimRequest {
                employee_id: Some("0999".to_string()),
                event: "Travel Allowance".to_string(),
                currency: "Euro".to_string(),
                ..CreateClaimRequest::default()
            })
            .await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::FieldNotFound);
        assert_eq!(failure.message, "Employee with ID '0999' not found");
        assert_eq!(launcher.launches(), 0);
    }

    #[tokio::test]
    async fn launch_failure_is_internal() {
        let site = FakeHrmSite::new();
        let launcher = Arc::new(cdp_adapter::scripted::ScriptedLauncher::failing(
            cdp_adapter::DriverError::Launch("no chromium".to_string()),
        ));
        let orchestrator = orchestrator(&site, launcher);

        let outcome = orchestrator
            .create_claim(CreateClaimRequest {
                employee_name: Some("Peter Lowenbrau Griffin".to_string()),
                event: "Travel Allowance".to_string(),
                currency: "Euro".to_string(),
                ..CreateClaimRequest::default()
            })
            .await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.class(), ErrorClass::Internal);
        assert!(failure.message.contains("no chromium"));
    }

    #[test]
    fn panics_become_internal_failures() {
        let panic: Box<dyn Any + Send> = Box::new("boom");
        let failure = unwind::<()>(Err(panic)).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Internal);
        assert_eq!(failure.message, "workflow panicked: boom");
    }
}
