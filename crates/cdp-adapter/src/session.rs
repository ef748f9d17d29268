//! Session lifecycle: one exclusive browser per workflow run, released exactly once.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hrm_core_types::SessionId;
use tracing::{debug, info, warn};

use crate::driver::BrowserDriver;
use crate::error::DriverError;
use crate::metrics;

/// Browser launch settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub headless: bool,
    /// Budget every flow wait derives from; also the per-command CDP timeout.
    pub timeout: Duration,
    pub window_width: u32,
    pub window_height: u32,
    pub executable: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout: Duration::from_secs(30),
            window_width: 1920,
            window_height: 1080,
            executable: None,
            extra_args: Vec::new(),
        }
    }
}

/// Starts browser instances. Implemented by the Chromium backend and the
/// scripted test backend.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn launch(&self, config: &SessionConfig) -> Result<Arc<dyn BrowserDriver>, DriverError>;
}

/// Guard owning one launched browser.
///
/// `release` quits the browser and consumes the guard. A guard dropped without
/// release (panic, early return) schedules the quit on the current runtime.
pub struct BrowserSession {
    id: SessionId,
    config: SessionConfig,
    driver: Arc<dyn BrowserDriver>,
    released: bool,
}

impl BrowserSession {
    pub async fn open(
        launcher: &dyn SessionLauncher,
        config: &SessionConfig,
    ) -> Result<Self, DriverError> {
        let started = Instant::now();
        let driver = match launcher.launch(config).await {
            Ok(driver) => driver,
            Err(err) => {
                metrics::record_launch_failure();
                warn!(backend = launcher.backend(), error = %err, "browser launch failed");
                return Err(err);
            }
        };
        metrics::record_session_launched(launcher.backend(), started.elapsed());
        let id = SessionId::new();
        info!(session = %id, backend = launcher.backend(), headless = config.headless, "browser session opened");
        Ok(Self {
            id,
            config: config.clone(),
            driver,
            released: false,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// Quits the browser. Errors are logged, not surfaced: the outcome of the
    /// workflow has already been decided when this runs.
    pub async fn release(mut self) {
        self.released = true;
        match self.driver.quit().await {
            Ok(()) => debug!(session = %self.id, "browser session released"),
            Err(err) => warn!(session = %self.id, error = %err, "browser quit failed"),
        }
        metrics::record_session_released();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!(session = %self.id, "browser session dropped without release");
        metrics::record_session_released();
        let driver = Arc::clone(&self.driver);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let _ = driver.quit().await;
                });
            }
            Err(_) => warn!(session = %self.id, "no runtime available to quit browser"),
        }
    }
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}
