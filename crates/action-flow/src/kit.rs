//! Shared per-run tooling handed to every flow.

use std::sync::Arc;
use std::time::Duration;

use action_primitives::{
    Diagnostics, DropdownResolver, OutcomeDetector, OutcomeSignals, SettlePauses, Waiter,
};
use regex::Regex;

use crate::locators::PageCatalog;

#[derive(Clone, Debug)]
pub struct FlowSettings {
    /// Per-session wait budget; also bounds every outcome detection.
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Sub-window for success/error indicators inside `timeout`.
    pub indicator_window: Duration,
    /// How long typeahead suggestions may keep loading.
    pub suggestion_window: Duration,
    pub case_sensitive: bool,
    pub confirm_job_save: bool,
    pub pauses: SettlePauses,
    pub diagnostics: Diagnostics,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            indicator_window: Duration::from_secs(10),
            suggestion_window: Duration::from_secs(10),
            case_sensitive: false,
            confirm_job_save: true,
            pauses: SettlePauses::default(),
            diagnostics: Diagnostics::new("diagnostics"),
        }
    }
}

/// Catalog plus the primitives built from it.
#[derive(Clone, Debug)]
pub struct FlowKit {
    pub catalog: Arc<PageCatalog>,
    pub settings: FlowSettings,
    pub waiter: Waiter,
    pub dropdowns: DropdownResolver,
    pub detector: OutcomeDetector,
}

impl FlowKit {
    pub fn new(catalog: Arc<PageCatalog>, settings: FlowSettings) -> Self {
        let waiter = Waiter::polling(settings.timeout, settings.poll_interval);
        let dropdowns = DropdownResolver::new(
            catalog.common.dropdown_options.clone(),
            catalog.common.dismiss_target.clone(),
            waiter.clone(),
            settings.pauses,
        );
        let detector = OutcomeDetector::new(waiter.clone(), settings.diagnostics.clone())
            .with_indicator_window(settings.indicator_window);
        Self {
            catalog,
            settings,
            waiter,
            dropdowns,
            detector,
        }
    }

    /// Indicator locators shared by every submission.
    pub(crate) fn signals(&self) -> OutcomeSignals {
        let common = &self.catalog.common;
        OutcomeSignals {
            busy: Some(common.busy_spinner.clone()),
            success: common.success_toast.clone(),
            error: common.error_toast.clone(),
            confirmations: Vec::new(),
        }
    }

    /// Checks every regex in the catalog.
    pub fn validate_catalog(catalog: &PageCatalog) -> Result<(), regex::Error> {
        Regex::new(&catalog.employee.id_url_pattern)?;
        Regex::new(&catalog.claim.details_url_pattern)?;
        Ok(())
    }
}
