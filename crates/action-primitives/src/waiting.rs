//! Bounded polling waits

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdp_adapter::{BrowserDriver, DriverError, ElementHandle, Locator};
use regex::Regex;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::errors::ActionError;

/// Conditions a flow can wait on.
#[derive(Clone, Debug)]
pub enum WaitCondition {
    /// At least one matching element is attached.
    Present(Locator),
    /// The first matching element is displayed.
    Visible(Locator),
    /// The first matching element is displayed and enabled.
    Clickable(Locator),
    /// No matching element is displayed.
    Hidden(Locator),
    UrlMatches(Regex),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Present(locator) => write!(f, "present({locator})"),
            WaitCondition::Visible(locator) => write!(f, "visible({locator})"),
            WaitCondition::Clickable(locator) => write!(f, "clickable({locator})"),
            WaitCondition::Hidden(locator) => write!(f, "hidden({locator})"),
            WaitCondition::UrlMatches(pattern) => write!(f, "url~/{}/", pattern.as_str()),
        }
    }
}

/// Result of a single probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    Pending,
    Met(Option<ElementHandle>),
}

impl WaitCondition {
    /// Evaluates the condition once against the live page.
    pub async fn probe(&self, driver: &dyn BrowserDriver) -> Result<Probe, DriverError> {
        match self {
            WaitCondition::Present(locator) => Ok(match driver.find(locator).await? {
                Some(handle) => Probe::Met(Some(handle)),
                None => Probe::Pending,
            }),
            WaitCondition::Visible(locator) => {
                let Some(handle) = driver.find(locator).await? else {
                    return Ok(Probe::Pending);
                };
                Ok(if driver.is_displayed(&handle).await? {
                    Probe::Met(Some(handle))
                } else {
                    Probe::Pending
                })
            }
            WaitCondition::Clickable(locator) => {
                let Some(handle) = driver.find(locator).await? else {
                    return Ok(Probe::Pending);
                };
                let ready =
                    driver.is_displayed(&handle).await? && driver.is_enabled(&handle).await?;
                Ok(if ready {
                    Probe::Met(Some(handle))
                } else {
                    Probe::Pending
                })
            }
            WaitCondition::Hidden(locator) => {
                for handle in driver.find_all(locator).await? {
                    match driver.is_displayed(&handle).await {
                        Ok(true) => return Ok(Probe::Pending),
                        Ok(false) | Err(DriverError::StaleElement(_)) => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(Probe::Met(None))
            }
            WaitCondition::UrlMatches(pattern) => {
                let url = driver.current_url().await?;
                Ok(if pattern.is_match(&url) {
                    Probe::Met(None)
                } else {
                    Probe::Pending
                })
            }
        }
    }
}

/// Waiting strategy trait
#[async_trait]
pub trait WaitStrategy: Send + Sync {
    /// Resolves once `condition` holds, or fails with `WaitTimeout` after `limit`.
    async fn wait(
        &self,
        driver: &dyn BrowserDriver,
        condition: &WaitCondition,
        limit: Duration,
    ) -> Result<Option<ElementHandle>, ActionError>;
}

/// Polls the condition at a fixed interval under a hard timeout.
#[derive(Clone, Debug)]
pub struct PollingWait {
    pub poll_interval: Duration,
}

impl Default for PollingWait {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl PollingWait {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    async fn poll(
        &self,
        driver: &dyn BrowserDriver,
        condition: &WaitCondition,
    ) -> Result<Option<ElementHandle>, ActionError> {
        loop {
            match condition.probe(driver).await {
                Ok(Probe::Met(handle)) => return Ok(handle),
                Ok(Probe::Pending) => {}
                Err(err) if err.is_transient() => {
                    debug!(condition = %condition, error = %err, "transient probe error, retrying");
                }
                Err(err) => return Err(err.into()),
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl WaitStrategy for PollingWait {
    async fn wait(
        &self,
        driver: &dyn BrowserDriver,
        condition: &WaitCondition,
        limit: Duration,
    ) -> Result<Option<ElementHandle>, ActionError> {
        match timeout(limit, self.poll(driver, condition)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(condition = %condition, timeout_ms = limit.as_millis() as u64, "wait timed out");
                Err(ActionError::WaitTimeout(format!(
                    "{condition} not met after {}ms",
                    limit.as_millis()
                )))
            }
        }
    }
}

/// A wait strategy bound to the session's wait budget.
#[derive(Clone)]
pub struct Waiter {
    strategy: Arc<dyn WaitStrategy>,
    limit: Duration,
    poll_interval: Duration,
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("limit", &self.limit)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Waiter {
    pub fn new(strategy: Arc<dyn WaitStrategy>, limit: Duration, poll_interval: Duration) -> Self {
        Self {
            strategy,
            limit,
            poll_interval,
        }
    }

    pub fn polling(limit: Duration, poll_interval: Duration) -> Self {
        Self::new(Arc::new(PollingWait::new(poll_interval)), limit, poll_interval)
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Same strategy with a different bound.
    pub fn with_limit(&self, limit: Duration) -> Self {
        Self {
            strategy: Arc::clone(&self.strategy),
            limit,
            poll_interval: self.poll_interval,
        }
    }

    pub async fn until(
        &self,
        driver: &dyn BrowserDriver,
        condition: &WaitCondition,
    ) -> Result<Option<ElementHandle>, ActionError> {
        self.strategy.wait(driver, condition, self.limit).await
    }

    pub async fn present(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> Result<ElementHandle, ActionError> {
        element(
            self.until(driver, &WaitCondition::Present(locator.clone()))
                .await?,
            locator,
        )
    }

    pub async fn visible(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> Result<ElementHandle, ActionError> {
        element(
            self.until(driver, &WaitCondition::Visible(locator.clone()))
                .await?,
            locator,
        )
    }

    pub async fn clickable(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> Result<ElementHandle, ActionError> {
        element(
            self.until(driver, &WaitCondition::Clickable(locator.clone()))
                .await?,
            locator,
        )
    }

    pub async fn hidden(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> Result<(), ActionError> {
        self.until(driver, &WaitCondition::Hidden(locator.clone()))
            .await
            .map(|_| ())
    }

    /// Waits until the element is clickable, then clicks it.
    pub async fn click(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> Result<ElementHandle, ActionError> {
        let handle = self.clickable(driver, locator).await?;
        driver.click(&handle).await?;
        debug!(locator = %locator, "clicked");
        Ok(handle)
    }

    /// Waits until the field is visible, clears it and types `text`.
    pub async fn fill(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
        text: &str,
    ) -> Result<ElementHandle, ActionError> {
        let handle = self.visible(driver, locator).await?;
        driver.clear(&handle).await?;
        driver.send_keys(&handle, text).await?;
        Ok(handle)
    }
}

fn element(handle: Option<ElementHandle>, locator: &Locator) -> Result<ElementHandle, ActionError> {
    handle.ok_or_else(|| ActionError::Internal(format!("wait on {locator} resolved without an element")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::scripted::{ScriptedBrowser, ScriptedElement};

    fn waiter(limit_ms: u64) -> Waiter {
        Waiter::polling(Duration::from_millis(limit_ms), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn visible_resolves_once_element_shows() {
        let browser = ScriptedBrowser::new("about:blank");
        let header = browser.add(ScriptedElement::new(Locator::css("h6")).hidden());
        browser.after(Duration::from_millis(30), move |page| page.show(header));

        let handle = waiter(1_000)
            .visible(&*browser, &Locator::css("h6"))
            .await
            .unwrap();
        assert_eq!(handle.id(), header);
    }

    #[tokio::test]
    async fn wait_times_out_within_bound() {
        let browser = ScriptedBrowser::new("about:blank");
        let started = std::time::Instant::now();
        let err = waiter(60)
            .visible(&*browser, &Locator::css(".never"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::WaitTimeout(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn hidden_ignores_detached_and_invisible_matches() {
        let browser = ScriptedBrowser::new("about:blank");
        let spinner = browser.add(ScriptedElement::new(Locator::css(".oxd-loading-spinner")));
        browser.add(ScriptedElement::new(Locator::css(".oxd-loading-spinner")).hidden());
        browser.after(Duration::from_millis(20), move |page| page.detach(spinner));

        waiter(1_000)
            .hidden(&*browser, &Locator::css(".oxd-loading-spinner"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn clickable_waits_for_enabled() {
        let browser = ScriptedBrowser::new("about:blank");
        let button = browser.add(ScriptedElement::new(Locator::css("button")).disabled());
        browser.after(Duration::from_millis(20), move |page| {
            if let Some(el) = page.element_mut(button) {
                el.enabled = true;
            }
        });

        waiter(1_000)
            .click(&*browser, &Locator::css("button"))
            .await
            .unwrap();
        assert_eq!(browser.clicked(&Locator::css("button")), 1);
    }

    #[tokio::test]
    async fn url_condition_matches_pattern() {
        let browser = ScriptedBrowser::new("https://hrm.test/web/index.php/claim/assignClaim");
        browser.after(Duration::from_millis(15), |page| {
            page.url = "https://hrm.test/web/index.php/claim/assignClaim/id/42".into();
        });
        let condition = WaitCondition::UrlMatches(Regex::new(r"/claim/assignClaim/id/\d+").unwrap());
        waiter(1_000).until(&*browser, &condition).await.unwrap();
    }

    #[tokio::test]
    async fn fill_clears_before_typing() {
        let browser = ScriptedBrowser::new("about:blank");
        let field = browser.add(ScriptedElement::input(Locator::name("lastName")).with_attr("value", "old"));
        waiter(500)
            .fill(&*browser, &Locator::name("lastName"), "Doe")
            .await
            .unwrap();
        assert_eq!(browser.with_page(|page| page.value(field)), "Doe");
    }
}
