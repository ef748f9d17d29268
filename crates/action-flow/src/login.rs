use action_primitives::settle;
use cdp_adapter::BrowserDriver;
use hrm_core_types::Failure;
use tracing::{info, instrument};

use crate::errors::{FlowError, StepExt};
use crate::kit::FlowKit;

/// Authenticates a fresh session with the operator credentials.
pub struct LoginFlow<'a> {
    kit: &'a FlowKit,
}

impl<'a> LoginFlow<'a> {
    pub fn new(kit: &'a FlowKit) -> Self {
        Self { kit }
    }

    /// No retry: bad credentials are an operator misconfiguration.
    #[instrument(name = "login", skip_all, fields(base_url = %base_url, username = %username))]
    pub async fn login(
        &self,
        driver: &dyn BrowserDriver,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<(), Failure> {
        self.run(driver, base_url, username, password)
            .await
            .map_err(Failure::from)
    }

    async fn run(
        &self,
        driver: &dyn BrowserDriver,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<(), FlowError> {
        let locators = &self.kit.catalog.login;
        let waiter = &self.kit.waiter;

        info!("navigating to login page");
        driver.navigate(base_url).await.step("open login page")?;

        waiter
            .fill(driver, &locators.username, username)
            .await
            .step("enter username")?;
        waiter
            .fill(driver, &locators.password, password)
            .await
            .step("enter password")?;
        waiter
            .click(driver, &locators.submit)
            .await
            .step("submit credentials")?;

        waiter
            .visible(driver, &locators.landmark)
            .await
            .step("await post-login landmark")?;
        settle(self.kit.settings.pauses.after_page_link).await;
        info!("login completed");
        Ok(())
    }
}
