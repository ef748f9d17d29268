//! Terminal-state detection after a form submission.
//!
//! Signals are checked in priority order on every tick: the error indicator
//! first (until a success indicator has been seen), then the success
//! indicator, then the confirmation surfaces. The indicator phase runs under
//! its own window nested inside the overall bound.

use std::time::Duration;

use cdp_adapter::{BrowserDriver, Locator};
use regex::Regex;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::diagnostics::Diagnostics;
use crate::errors::ActionError;
use crate::waiting::{Probe, WaitCondition, Waiter};

const DEFAULT_INDICATOR_WINDOW: Duration = Duration::from_secs(10);

/// A view that only exists once a submission has been accepted.
#[derive(Clone, Debug)]
pub enum Confirmation {
    /// A dialog attached to the document.
    Modal(Locator),
    /// A visible landmark of the destination view.
    Landmark(Locator),
    /// The browser has navigated to a matching URL.
    Url(Regex),
}

impl Confirmation {
    fn condition(&self) -> WaitCondition {
        match self {
            Confirmation::Modal(locator) => WaitCondition::Present(locator.clone()),
            Confirmation::Landmark(locator) => WaitCondition::Visible(locator.clone()),
            Confirmation::Url(pattern) => WaitCondition::UrlMatches(pattern.clone()),
        }
    }

    fn signal(&self) -> Signal {
        match self {
            Confirmation::Modal(_) => Signal::Modal,
            Confirmation::Landmark(_) => Signal::Landmark,
            Confirmation::Url(_) => Signal::Url,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OutcomeSignals {
    /// Busy overlay that must clear before indicators are meaningful.
    pub busy: Option<Locator>,
    pub success: Locator,
    pub error: Locator,
    /// Any one of these confirms the submission. Empty means the success
    /// indicator alone is sufficient.
    pub confirmations: Vec<Confirmation>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Modal,
    Landmark,
    Url,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub success_indicator: bool,
    pub confirmation: Option<Signal>,
}

#[derive(Clone, Debug)]
pub struct OutcomeDetector {
    waiter: Waiter,
    indicator_window: Duration,
    diagnostics: Diagnostics,
}

impl OutcomeDetector {
    pub fn new(waiter: Waiter, diagnostics: Diagnostics) -> Self {
        let indicator_window = DEFAULT_INDICATOR_WINDOW.min(waiter.limit());
        Self {
            waiter,
            indicator_window,
            diagnostics,
        }
    }

    pub fn with_indicator_window(mut self, window: Duration) -> Self {
        self.indicator_window = window.min(self.waiter.limit());
        self
    }

    /// Waits for the outcome of the submission labelled `label`.
    ///
    /// Fails with `SubmissionFailed` when the error indicator shows first and
    /// with `NavTimeout` when nothing conclusive appears within the bound; the
    /// latter also captures diagnostics.
    pub async fn detect(
        &self,
        driver: &dyn BrowserDriver,
        signals: &OutcomeSignals,
        label: &str,
    ) -> Result<Outcome, ActionError> {
        let limit = self.waiter.limit();
        let result = match timeout(limit, self.run(driver, signals, label)).await {
            Ok(result) => result,
            Err(_) => Err(ActionError::NavTimeout(format!(
                "{label}: no outcome signal within {}ms",
                limit.as_millis()
            ))),
        };

        if let Err(ActionError::NavTimeout(message)) = &result {
            warn!(label = %label, message = %message, "submission outcome timed out");
            self.diagnostics
                .capture(driver, &format!("{label}_error"))
                .await;
        }
        result
    }

    async fn run(
        &self,
        driver: &dyn BrowserDriver,
        signals: &OutcomeSignals,
        label: &str,
    ) -> Result<Outcome, ActionError> {
        // `None` when the bound is past the clock's range; the outer timeout
        // still applies in that case.
        let deadline = Instant::now().checked_add(self.waiter.limit());
        let poll = self.waiter.poll_interval();

        if let Some(busy) = &signals.busy {
            let remaining = deadline
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or_else(|| self.waiter.limit());
            self.waiter
                .with_limit(remaining)
                .hidden(driver, busy)
                .await
                .map_err(|err| match err {
                    ActionError::WaitTimeout(msg) => ActionError::NavTimeout(msg),
                    other => other,
                })?;
        }

        let indicator_deadline = earliest(
            Instant::now().checked_add(self.indicator_window),
            deadline,
        );
        let mut success = false;
        loop {
            if self.holds(driver, &WaitCondition::Visible(signals.error.clone())).await? {
                warn!(label = %label, "error indicator appeared");
                return Err(ActionError::SubmissionFailed(label.to_string()));
            }
            if self.holds(driver, &WaitCondition::Visible(signals.success.clone())).await? {
                info!(label = %label, "success indicator appeared");
                success = true;
                break;
            }
            if passed(indicator_deadline) {
                debug!(label = %label, "no indicator, checking confirmation surfaces");
                break;
            }
            if self.confirmed(driver, signals).await?.is_some() {
                break;
            }
            sleep(poll).await;
        }

        if signals.confirmations.is_empty() {
            return if success {
                Ok(Outcome {
                    success_indicator: true,
                    confirmation: None,
                })
            } else {
                Err(ActionError::NavTimeout(format!(
                    "{label}: no success indicator"
                )))
            };
        }

        loop {
            if !success {
                if self.holds(driver, &WaitCondition::Visible(signals.error.clone())).await? {
                    warn!(label = %label, "error indicator appeared");
                    return Err(ActionError::SubmissionFailed(label.to_string()));
                }
                success = self
                    .holds(driver, &WaitCondition::Visible(signals.success.clone()))
                    .await?;
            }
            if let Some(signal) = self.confirmed(driver, signals).await? {
                info!(label = %label, signal = ?signal, success_indicator = success, "submission confirmed");
                return Ok(Outcome {
                    success_indicator: success,
                    confirmation: Some(signal),
                });
            }
            if passed(deadline) {
                return Err(ActionError::NavTimeout(format!(
                    "{label}: no confirmation surface within {}ms",
                    self.waiter.limit().as_millis()
                )));
            }
            sleep(poll).await;
        }
    }

    async fn confirmed(
        &self,
        driver: &dyn BrowserDriver,
        signals: &OutcomeSignals,
    ) -> Result<Option<Signal>, ActionError> {
        for confirmation in &signals.confirmations {
            if self.holds(driver, &confirmation.condition()).await? {
                return Ok(Some(confirmation.signal()));
            }
        }
        Ok(None)
    }

    async fn holds(
        &self,
        driver: &dyn BrowserDriver,
        condition: &WaitCondition,
    ) -> Result<bool, ActionError> {
        match condition.probe(driver).await {
            Ok(Probe::Met(_)) => Ok(true),
            Ok(Probe::Pending) => Ok(false),
            Err(err) if err.is_transient() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use cdp_adapter::scripted::{DriverCall, ScriptedBrowser, ScriptedElement};

    const SUCCESS: &str = ".oxd-toast.oxd-toast--success";
    const ERROR: &str = ".oxd-toast.oxd-toast--error";
    const MODAL: &str = ".oxd-dialog";

    fn detector(limit_ms: u64) -> OutcomeDetector {
        OutcomeDetector::new(
            Waiter::polling(Duration::from_millis(limit_ms), Duration::from_millis(5)),
            Diagnostics::disabled(),
        )
        .with_indicator_window(Duration::from_millis(limit_ms / 2))
    }

    fn signals(confirmations: Vec<Confirmation>) -> OutcomeSignals {
        OutcomeSignals {
            busy: Some(Locator::css(".oxd-loading-spinner")),
            success: Locator::css(SUCCESS),
            error: Locator::css(ERROR),
            confirmations,
        }
    }

    struct Page {
        browser: Arc<ScriptedBrowser>,
        success: u64,
        error: u64,
        modal: u64,
    }

    fn page() -> Page {
        let browser = ScriptedBrowser::new("https://hrm.test/claim/assignClaim");
        let success = browser.add(ScriptedElement::new(Locator::css(SUCCESS)).hidden());
        let error = browser.add(ScriptedElement::new(Locator::css(ERROR)).hidden());
        let modal = browser.add(ScriptedElement::new(Locator::css(MODAL)).detached());
        Page {
            browser,
            success,
            error,
            modal,
        }
    }

    #[tokio::test]
    async fn success_indicator_then_modal() {
        let p = page();
        let (success, modal) = (p.success, p.modal);
        p.browser.after(Duration::from_millis(10), move |page| page.show(success));
        p.browser.after(Duration::from_millis(30), move |page| page.show(modal));

        let outcome = detector(1_000)
            .detect(&*p.browser, &signals(vec![Confirmation::Modal(Locator::css(MODAL))]), "claim")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome {
                success_indicator: true,
                confirmation: Some(Signal::Modal)
            }
        );
    }

    #[tokio::test]
    async fn error_short_circuits_even_if_success_follows() {
        let p = page();
        let (success, error, modal) = (p.success, p.error, p.modal);
        p.browser.after(Duration::from_millis(10), move |page| page.show(error));
        p.browser.after(Duration::from_millis(40), move |page| {
            page.show(success);
            page.show(modal);
        });

        let err = detector(1_000)
            .detect(&*p.browser, &signals(vec![Confirmation::Modal(Locator::css(MODAL))]), "claim")
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::SubmissionFailed("claim".into()));
    }

    #[tokio::test]
    async fn url_confirms_without_indicator() {
        let p = page();
        p.browser.after(Duration::from_millis(20), |page| {
            page.url = "https://hrm.test/claim/assignClaim/id/17".into();
        });
        let pattern = Regex::new(r"/claim/assignClaim/id/\d+").unwrap();
        let outcome = detector(500)
            .detect(&*p.browser, &signals(vec![Confirmation::Url(pattern)]), "claim")
            .await
            .unwrap();
        assert_eq!(outcome.confirmation, Some(Signal::Url));
        assert!(!outcome.success_indicator);
    }

    #[tokio::test]
    async fn success_alone_suffices_without_confirmations() {
        let p = page();
        let success = p.success;
        p.browser.after(Duration::from_millis(10), move |page| page.show(success));
        let outcome = detector(500)
            .detect(&*p.browser, &signals(Vec::new()), "job_details")
            .await
            .unwrap();
        assert!(outcome.success_indicator);
        assert_eq!(outcome.confirmation, None);
    }

    #[tokio::test]
    async fn nothing_appears_times_out_and_captures_page() {
        let p = page();
        let started = std::time::Instant::now();
        let err = detector(120)
            .detect(&*p.browser, &signals(vec![Confirmation::Modal(Locator::css(MODAL))]), "claim_navigation")
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NavTimeout(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(p.browser.calls().contains(&DriverCall::PageContent));
    }

    #[tokio::test]
    async fn unbounded_limit_still_detects_success() {
        let p = page();
        let success = p.success;
        p.browser.with_page(|page| page.show(success));

        let outcome = OutcomeDetector::new(
            Waiter::polling(Duration::from_secs(u64::MAX), Duration::from_millis(5)),
            Diagnostics::disabled(),
        )
        .detect(&*p.browser, &signals(Vec::new()), "employee")
        .await
        .unwrap();
        assert!(outcome.success_indicator);
    }

    #[tokio::test]
    async fn waits_for_busy_overlay_to_clear() {
        let p = page();
        let spinner = p
            .browser
            .add(ScriptedElement::new(Locator::css(".oxd-loading-spinner")));
        let success = p.success;
        // Success toast is already up while the spinner still covers the page.
        p.browser.with_page(|page| page.show(success));
        p.browser.after(Duration::from_millis(25), move |page| page.detach(spinner));

        let outcome = detector(1_000)
            .detect(&*p.browser, &signals(Vec::new()), "employee")
            .await
            .unwrap();
        assert!(outcome.success_indicator);
    }
}
