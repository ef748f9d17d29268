//! Browser driver capability set for the workflow engine.
//!
//! Flows never talk to Chromium directly. They go through [`BrowserDriver`],
//! a small Selenium-shaped surface (find, click, type, read, script, capture)
//! that the Chromium backend implements over the DevTools protocol and the
//! `scripted` backend implements in memory for tests.

pub mod chromium;
pub mod driver;
pub mod error;
pub mod locator;
pub mod metrics;
#[cfg(feature = "scripted")]
pub mod scripted;
pub mod session;

pub use chromium::{ChromiumDriver, ChromiumLauncher};
pub use driver::{BrowserDriver, ElementHandle, ScriptArg};
pub use error::DriverError;
pub use locator::Locator;
pub use session::{BrowserSession, SessionConfig, SessionLauncher};
