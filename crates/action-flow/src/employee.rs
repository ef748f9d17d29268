//! Two-phase employee creation: personal details, then job details.

use action_primitives::{settle, Confirmation};
use cdp_adapter::{BrowserDriver, ScriptArg};
use chrono::NaiveDate;
use hrm_core_types::{Failure, JobDetails, NewEmployee};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::errors::{outcome_failure, FlowError, StepExt};
use crate::ids::IdCandidateSource;
use crate::kit::FlowKit;

/// The id input is framework-managed and drops synthesized keystrokes, so the
/// candidate is written straight into the DOM and announced with an input event.
const INJECT_ID_SCRIPT: &str = "arguments[0].value = arguments[1]; \
     arguments[0].dispatchEvent(new Event('input', { bubbles: true })); \
     return arguments[0].value;";

pub const JOIN_DATE_FORMAT: &str = "%Y-%m-%d";

pub struct EmployeeCreationFlow<'a> {
    kit: &'a FlowKit,
    ids: &'a dyn IdCandidateSource,
}

impl<'a> EmployeeCreationFlow<'a> {
    pub fn new(kit: &'a FlowKit, ids: &'a dyn IdCandidateSource) -> Self {
        Self { kit, ids }
    }

    /// Runs both phases and returns the authoritative employee id.
    ///
    /// A Phase B failure still fails the whole flow even though the identity
    /// already exists in the target system.
    #[instrument(name = "create_employee", skip_all, fields(first = %employee.first_name, last = %employee.last_name))]
    pub async fn create(
        &self,
        driver: &dyn BrowserDriver,
        employee: &NewEmployee,
        job: &JobDetails,
        join_date: NaiveDate,
    ) -> Result<String, Failure> {
        let employee_id = self.personal_details(driver, employee).await?;
        info!(employee_id = %employee_id, "personal details saved");
        self.job_details(driver, job, join_date).await?;
        info!(employee_id = %employee_id, "job details saved");
        Ok(employee_id)
    }

    /// Phase A. Returns the id the target system settled on.
    pub async fn personal_details(
        &self,
        driver: &dyn BrowserDriver,
        employee: &NewEmployee,
    ) -> Result<String, Failure> {
        self.run_personal_details(driver, employee)
            .await
            .map_err(Failure::from)
    }

    /// Phase B. Dropdowns resolve strictly in `JobField::ORDER`.
    pub async fn job_details(
        &self,
        driver: &dyn BrowserDriver,
        job: &JobDetails,
        join_date: NaiveDate,
    ) -> Result<(), Failure> {
        self.run_job_details(driver, job, join_date)
            .await
            .map_err(Failure::from)
    }

    async fn run_personal_details(
        &self,
        driver: &dyn BrowserDriver,
        employee: &NewEmployee,
    ) -> Result<String, FlowError> {
        let locators = &self.kit.catalog.employee;
        let waiter = &self.kit.waiter;
        let pauses = &self.kit.settings.pauses;

        info!("navigating to Add Employee");
        waiter
            .click(driver, &locators.pim_menu)
            .await
            .step("open PIM menu")?;
        settle(pauses.after_menu).await;
        waiter
            .click(driver, &locators.add_employee_link)
            .await
            .step("open Add Employee")?;
        settle(pauses.after_page_link).await;

        waiter
            .fill(driver, &locators.first_name, &employee.first_name)
            .await
            .step("enter first name")?;
        if let Some(middle) = employee.middle() {
            waiter
                .fill(driver, &locators.middle_name, middle)
                .await
                .step("enter middle name")?;
        }
        waiter
            .fill(driver, &locators.last_name, &employee.last_name)
            .await
            .step("enter last name")?;

        let id_field = waiter
            .clickable(driver, &locators.employee_id)
            .await
            .step("locate employee id field")?;
        let initial = driver
            .attribute(&id_field, "value")
            .await
            .step("read suggested employee id")?;
        debug!(initial = ?initial, "employee id suggested by the form");

        let candidate = self.ids.next_candidate();
        driver
            .execute_script(
                INJECT_ID_SCRIPT,
                &[
                    ScriptArg::Element(id_field),
                    ScriptArg::Value(Value::String(candidate.clone())),
                ],
            )
            .await
            .step("inject employee id")?;
        settle(pauses.after_id_injection).await;

        let readback = driver
            .attribute(&id_field, "value")
            .await
            .step("read back employee id")?
            .unwrap_or_default();
        if readback != candidate {
            warn!(expected = %candidate, actual = %readback, "employee id readback mismatch");
            return Err(Failure::id_mismatch(candidate, readback).into());
        }
        info!(employee_id = %candidate, "employee id set");

        waiter
            .click(driver, &locators.save_button)
            .await
            .step("save personal details")?;

        let mut signals = self.kit.signals();
        signals.confirmations = vec![Confirmation::Landmark(
            locators.personal_details_header.clone(),
        )];
        self.kit
            .detector
            .detect(driver, &signals, "save_employee")
            .await
            .map_err(|err| {
                outcome_failure(err, "Employee", "Failed to reach the Personal Details page")
            })?;

        self.final_id(driver, &candidate).await
    }

    /// The numeric id in the post-save URL wins; otherwise the id field.
    async fn final_id(
        &self,
        driver: &dyn BrowserDriver,
        candidate: &str,
    ) -> Result<String, FlowError> {
        let locators = &self.kit.catalog.employee;
        let pattern = Regex::new(&locators.id_url_pattern)
            .map_err(|err| Failure::internal(format!("invalid employee id url pattern: {err}")))?;

        let url = driver.current_url().await.step("read post-save url")?;
        if let Some(id) = pattern
            .captures(&url)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
        {
            debug!(url = %url, employee_id = %id, "employee id taken from url");
            return Ok(id);
        }

        let field = self
            .kit
            .waiter
            .present(driver, &locators.employee_id)
            .await
            .step("locate saved employee id")?;
        let id = driver
            .attribute(&field, "value")
            .await
            .step("read saved employee id")?
            .map(|value| value.trim().to_string())
            .unwrap_or_default();
        if id.is_empty() {
            return Err(Failure::id_mismatch(candidate, id).into());
        }
        Ok(id)
    }

    async fn run_job_details(
        &self,
        driver: &dyn BrowserDriver,
        job: &JobDetails,
        join_date: NaiveDate,
    ) -> Result<(), FlowError> {
        let locators = &self.kit.catalog.job;
        let waiter = &self.kit.waiter;
        let settings = &self.kit.settings;

        info!("navigating to Job tab");
        waiter
            .click(driver, &locators.job_tab)
            .await
            .step("open Job tab")?;
        settle(settings.pauses.after_page_link).await;

        for (field, label) in job.ordered() {
            let dropdown = waiter
                .clickable(driver, locators.dropdown(field))
                .await
                .step("locate job dropdown")?;
            let selected = self
                .kit
                .dropdowns
                .select(driver, &dropdown, label, settings.case_sensitive)
                .await
                .step("select job option")?;
            if !selected {
                warn!(field = field.label(), label = %label, "job option not found");
                return Err(Failure::dropdown_option_not_found(field.label(), label).into());
            }
        }

        waiter
            .fill(
                driver,
                &locators.joined_date,
                &join_date.format(JOIN_DATE_FORMAT).to_string(),
            )
            .await
            .step("enter joined date")?;

        let signals = self.kit.signals();
        if settings.confirm_job_save {
            // A toast left over from Phase A must not confirm this save.
            if let Err(err) = waiter.hidden(driver, &signals.success).await {
                debug!(error = %err, "previous success toast still showing");
            }
        }

        waiter
            .click(driver, &locators.save_button)
            .await
            .step("save job details")?;

        if settings.confirm_job_save {
            self.kit
                .detector
                .detect(driver, &signals, "save_job_details")
                .await
                .map_err(|err| {
                    outcome_failure(err, "Job details", "Job details save was not confirmed")
                })?;
        } else {
            settle(settings.pauses.job_save).await;
        }
        Ok(())
    }
}
