//! Assign Claim: typeahead employee lookup, event and currency selection,
//! submission and reference id extraction.

use action_primitives::{settle, ActionError, Confirmation, Signal};
use cdp_adapter::{BrowserDriver, ElementHandle, Locator};
use hrm_core_types::{ClaimResult, Failure};
use regex::Regex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::errors::{outcome_failure, FlowError, StepExt};
use crate::kit::FlowKit;

/// What the typeahead currently offers.
#[derive(Debug)]
enum Suggestions {
    /// Only placeholders or nothing rendered yet.
    Pending,
    /// The search finished without a match.
    Empty,
    Candidate(ElementHandle, String),
}

pub struct ClaimCreationFlow<'a> {
    kit: &'a FlowKit,
}

impl<'a> ClaimCreationFlow<'a> {
    pub fn new(kit: &'a FlowKit) -> Self {
        Self { kit }
    }

    /// Creates a claim for the employee shown as `display_name`.
    #[instrument(name = "create_claim", skip_all, fields(employee = %display_name, event = %event, currency = %currency))]
    pub async fn create(
        &self,
        driver: &dyn BrowserDriver,
        display_name: &str,
        event: &str,
        currency: &str,
        remarks: Option<&str>,
    ) -> Result<ClaimResult, Failure> {
        self.run(driver, display_name, event, currency, remarks)
            .await
            .map_err(Failure::from)
    }

    async fn run(
        &self,
        driver: &dyn BrowserDriver,
        display_name: &str,
        event: &str,
        currency: &str,
        remarks: Option<&str>,
    ) -> Result<ClaimResult, FlowError> {
        let locators = &self.kit.catalog.claim;
        let waiter = &self.kit.waiter;
        let settings = &self.kit.settings;

        info!("navigating to Assign Claim");
        waiter
            .click(driver, &locators.claim_menu)
            .await
            .step("open Claim menu")?;
        settle(settings.pauses.after_menu).await;
        waiter
            .click(driver, &locators.assign_claim_link)
            .await
            .step("open Assign Claim")?;
        settle(settings.pauses.after_page_link).await;

        self.pick_employee(driver, display_name).await?;
        self.pick_option(driver, &locators.event, "Event", event)
            .await?;
        self.pick_option(driver, &locators.currency, "Currency", currency)
            .await?;

        if let Some(remarks) = remarks {
            waiter
                .fill(driver, &locators.remarks, remarks)
                .await
                .step("enter remarks")?;
        }

        waiter
            .click(driver, &locators.create_button)
            .await
            .step("submit claim")?;

        let details_url = Regex::new(&locators.details_url_pattern)
            .map_err(|err| Failure::internal(format!("invalid claim details url pattern: {err}")))?;
        let mut signals = self.kit.signals();
        signals.confirmations = vec![
            Confirmation::Modal(locators.modal.clone()),
            Confirmation::Url(details_url),
        ];
        let outcome = self
            .kit
            .detector
            .detect(driver, &signals, "claim_navigation")
            .await
            .map_err(|err| {
                outcome_failure(err, "Claim", "Failed to navigate to claim details page")
            })?;
        if outcome.confirmation == Some(Signal::Modal) {
            settle(settings.pauses.modal_render).await;
        }

        let reference_id = self.reference_id(driver).await?;
        info!(reference_id = %reference_id, "claim created");
        Ok(ClaimResult { reference_id })
    }

    /// Types the name and clicks the first real suggestion. Gives up without
    /// submitting anything when the search yields nothing.
    async fn pick_employee(
        &self,
        driver: &dyn BrowserDriver,
        display_name: &str,
    ) -> Result<(), FlowError> {
        let locators = &self.kit.catalog.claim;
        let settings = &self.kit.settings;

        self.kit
            .waiter
            .fill(driver, &locators.employee_name, display_name)
            .await
            .step("enter employee name")?;
        settle(settings.pauses.typeahead_debounce).await;

        let deadline = Instant::now() + settings.suggestion_window;
        loop {
            match self.suggestions(driver).await.step("read suggestions")? {
                Suggestions::Candidate(handle, text) => {
                    debug!(suggestion = %text, "selecting employee suggestion");
                    driver
                        .click(&handle)
                        .await
                        .step("select employee suggestion")?;
                    settle(settings.pauses.after_option_click).await;
                    return Ok(());
                }
                Suggestions::Empty => {
                    warn!(employee = %display_name, "typeahead returned no records");
                    return Err(Failure::suggestion_not_found(display_name).into());
                }
                Suggestions::Pending if Instant::now() >= deadline => {
                    warn!(employee = %display_name, "no suggestion within window");
                    return Err(Failure::suggestion_not_found(display_name).into());
                }
                Suggestions::Pending => sleep(settings.poll_interval).await,
            }
        }
    }

    async fn suggestions(&self, driver: &dyn BrowserDriver) -> Result<Suggestions, ActionError> {
        let locators = &self.kit.catalog.claim;
        let mut empty = false;
        for handle in driver.find_all(&locators.suggestions).await? {
            let text = match driver.text(&handle).await {
                Ok(text) => text.trim().to_string(),
                Err(err) if err.is_transient() => continue,
                Err(err) => return Err(err.into()),
            };
            if text.is_empty() || locators.suggestions_loading.iter().any(|p| *p == text) {
                continue;
            }
            if locators.suggestions_empty.iter().any(|p| *p == text) {
                empty = true;
                continue;
            }
            return Ok(Suggestions::Candidate(handle, text));
        }
        Ok(if empty {
            Suggestions::Empty
        } else {
            Suggestions::Pending
        })
    }

    async fn pick_option(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
        field: &'static str,
        label: &str,
    ) -> Result<(), FlowError> {
        let dropdown = self
            .kit
            .waiter
            .clickable(driver, locator)
            .await
            .step("locate claim dropdown")?;
        let selected = self
            .kit
            .dropdowns
            .select(driver, &dropdown, label, self.kit.settings.case_sensitive)
            .await
            .step("select claim option")?;
        if selected {
            Ok(())
        } else {
            warn!(field, label = %label, "claim option not found");
            Err(Failure::dropdown_option_not_found(field, label).into())
        }
    }

    async fn reference_id(&self, driver: &dyn BrowserDriver) -> Result<String, FlowError> {
        let locators = &self.kit.catalog.claim;
        let field = match self.kit.waiter.present(driver, &locators.reference_id).await {
            Ok(field) => field,
            Err(ActionError::WaitTimeout(message)) => {
                warn!(message = %message, "reference id field never appeared");
                self.kit
                    .settings
                    .diagnostics
                    .capture(driver, "reference_id")
                    .await;
                return Err(Failure::reference_id_missing().into());
            }
            Err(source) => {
                return Err(FlowError::Step {
                    step: "locate reference id",
                    source,
                })
            }
        };

        let value = driver
            .attribute(&field, "value")
            .await
            .step("read reference id")?
            .map(|value| value.trim().to_string())
            .unwrap_or_default();
        if value.is_empty() {
            return Err(Failure::reference_id_missing().into());
        }
        Ok(value)
    }
}
