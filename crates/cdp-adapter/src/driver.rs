//! The capability set every flow is written against.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DriverError;
use crate::locator::Locator;

/// Opaque reference to an element found in the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Argument passed to an injected script, addressable as `arguments[i]`.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptArg {
    Element(ElementHandle),
    Value(Value),
}

impl From<ElementHandle> for ScriptArg {
    fn from(handle: ElementHandle) -> Self {
        ScriptArg::Element(handle)
    }
}

impl From<&str> for ScriptArg {
    fn from(value: &str) -> Self {
        ScriptArg::Value(Value::String(value.to_string()))
    }
}

/// One exclusive browser instance. Every call is a single round trip; waiting
/// is the caller's job.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// First element matching the locator, if any is attached right now.
    async fn find(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError>;

    /// Every element matching the locator, in document order.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Rendered text of the element.
    async fn text(&self, element: &ElementHandle) -> Result<String, DriverError>;

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError>;

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, DriverError>;

    /// Runs `script` as a function body; `args` are bound to `arguments`.
    async fn execute_script(&self, script: &str, args: &[ScriptArg])
        -> Result<Value, DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn page_content(&self) -> Result<String, DriverError>;

    /// PNG screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// Closes the browser. Calling it twice is a no-op.
    async fn quit(&self) -> Result<(), DriverError>;
}
