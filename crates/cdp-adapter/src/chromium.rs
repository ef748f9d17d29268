//! Chromium backend over the DevTools protocol.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use dashmap::DashMap;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::driver::{BrowserDriver, ElementHandle, ScriptArg};
use crate::error::DriverError;
use crate::locator::Locator;
use crate::metrics;
use crate::session::{SessionConfig, SessionLauncher};

const BASE_ARGS: &[&str] = &["--disable-dev-shm-usage", "--disable-gpu"];

const IS_DISPLAYED_FN: &str = r#"function() {
    if (!this.isConnected) return false;
    const style = window.getComputedStyle(this);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    const rect = this.getBoundingClientRect();
    return rect.width > 0 || rect.height > 0 || this.getClientRects().length > 0;
}"#;

const IS_ENABLED_FN: &str = r#"function() {
    return !(this.disabled || this.hasAttribute('disabled'));
}"#;

const CLEAR_FN: &str = r#"function() {
    if ('value' in this) {
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
        this.dispatchEvent(new Event('change', { bubbles: true }));
    }
}"#;

const IS_CONNECTED_FN: &str = "function() { return this.isConnected; }";

/// Launches a local Chromium for every session.
#[derive(Clone, Debug, Default)]
pub struct ChromiumLauncher;

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    fn backend(&self) -> &'static str {
        "chromium"
    }

    async fn launch(&self, config: &SessionConfig) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        let driver = ChromiumDriver::launch(config).await?;
        Ok(Arc::new(driver))
    }
}

/// One Chromium process with a single page.
pub struct ChromiumDriver {
    browser: Mutex<Option<Browser>>,
    handler: std::sync::Mutex<Option<JoinHandle<()>>>,
    page: Page,
    elements: DashMap<u64, Arc<Element>>,
    next_handle: AtomicU64,
    closed: AtomicBool,
}

impl ChromiumDriver {
    pub async fn launch(config: &SessionConfig) -> Result<Self, DriverError> {
        let browser_config = browser_config(config)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|err| DriverError::Launch(err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(target: "cdp-adapter", ?err, "cdp handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler_task.abort();
                return Err(DriverError::Launch(err.to_string()));
            }
        };

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: std::sync::Mutex::new(Some(handler_task)),
            page,
            elements: DashMap::new(),
            next_handle: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DriverError::Closed);
        }
        Ok(())
    }

    fn register(&self, element: Element) -> ElementHandle {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.elements.insert(id, Arc::new(element));
        ElementHandle::new(id)
    }

    fn element(&self, handle: &ElementHandle) -> Result<Arc<Element>, DriverError> {
        self.ensure_open()?;
        self.elements
            .get(&handle.id())
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DriverError::StaleElement(handle.id()))
    }

    async fn call_on(
        &self,
        handle: &ElementHandle,
        function: &str,
        command: &str,
    ) -> Result<Option<Value>, DriverError> {
        let element = self.element(handle)?;
        let returns = element
            .call_js_fn(function, false)
            .await
            .map_err(|err| self.command_error(command, handle, err))?;
        Ok(returns.result.value)
    }

    fn command_error(
        &self,
        command: &str,
        handle: &ElementHandle,
        err: impl std::fmt::Display,
    ) -> DriverError {
        metrics::record_command_failure(command);
        let message = err.to_string();
        if message.contains("Could not find node") || message.contains("No node with given id") {
            self.elements.remove(&handle.id());
            DriverError::StaleElement(handle.id())
        } else if message.contains("not visible") || message.contains("not interactable") {
            DriverError::NotInteractable(message)
        } else {
            DriverError::Protocol(message)
        }
    }

    fn page_error(&self, command: &str, err: impl std::fmt::Display) -> DriverError {
        metrics::record_command_failure(command);
        DriverError::protocol(err)
    }

    async fn ensure_connected(&self, handle: &ElementHandle) -> Result<(), DriverError> {
        let connected = self
            .call_on(handle, IS_CONNECTED_FN, "is_connected")
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if connected {
            Ok(())
        } else {
            self.elements.remove(&handle.id());
            Err(DriverError::StaleElement(handle.id()))
        }
    }
}

fn browser_config(config: &SessionConfig) -> Result<BrowserConfig, DriverError> {
    let mut builder = BrowserConfig::builder()
        .request_timeout(config.timeout)
        .window_size(config.window_width, config.window_height)
        .no_sandbox()
        .args(BASE_ARGS.iter().copied());

    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(executable) = &config.executable {
        if !executable.exists() {
            return Err(DriverError::Launch(format!(
                "chrome executable not found at {}",
                executable.display()
            )));
        }
        builder = builder.chrome_executable(executable.clone());
    }
    for arg in &config.extra_args {
        builder = builder.arg(arg.clone());
    }

    builder
        .build()
        .map_err(|err| DriverError::Launch(format!("browser config error: {err}")))
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.elements.clear();
        if let Err(err) = self.page.goto(url).await {
            return Err(self.page_error("navigate", err));
        }
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError> {
        Ok(self.find_all(locator).await?.into_iter().next())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        self.ensure_open()?;
        let found = match locator {
            Locator::XPath(expression) => self.page.find_xpaths(expression.as_str()).await,
            other => {
                let selector = other.as_css().unwrap_or_default();
                self.page.find_elements(selector).await
            }
        };
        match found {
            Ok(elements) => Ok(elements.into_iter().map(|el| self.register(el)).collect()),
            // Zero matches surfaces as a protocol error on some Chromium builds.
            Err(err) if err.to_string().contains("Could not find node") => Ok(Vec::new()),
            Err(err) => Err(self.page_error("find", err)),
        }
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.ensure_connected(element).await?;
        let el = self.element(element)?;
        el.click()
            .await
            .map_err(|err| self.command_error("click", element, err))?;
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.call_on(element, CLEAR_FN, "clear").await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.ensure_connected(element).await?;
        let el = self.element(element)?;
        el.focus()
            .await
            .map_err(|err| self.command_error("send_keys", element, err))?;
        el.type_str(text)
            .await
            .map_err(|err| self.command_error("send_keys", element, err))?;
        Ok(())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        // Selenium semantics: properties such as `value` win over the HTML attribute.
        let function = format!(
            "function() {{ const name = {name}; if (name in this && this[name] !== undefined && this[name] !== null) {{ return String(this[name]); }} return this.getAttribute(name); }}",
            name = serde_json::to_string(name).map_err(DriverError::protocol)?
        );
        let value = self.call_on(element, &function, "attribute").await?;
        Ok(value.and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }))
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, DriverError> {
        let el = self.element(element)?;
        let text = el
            .inner_text()
            .await
            .map_err(|err| self.command_error("text", element, err))?;
        Ok(text.unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        let value = self.call_on(element, IS_DISPLAYED_FN, "is_displayed").await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        let value = self.call_on(element, IS_ENABLED_FN, "is_enabled").await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn execute_script(
        &self,
        script: &str,
        args: &[ScriptArg],
    ) -> Result<Value, DriverError> {
        self.ensure_open()?;
        let declaration = format!("function() {{ {script} }}");

        let mut anchor = None;
        let mut call_args = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                ScriptArg::Element(handle) => {
                    let element = self.element(handle)?;
                    if anchor.is_none() {
                        anchor = Some(element.remote_object_id.clone());
                    }
                    call_args.push(
                        CallArgument::builder()
                            .object_id(element.remote_object_id.clone())
                            .build(),
                    );
                }
                ScriptArg::Value(value) => {
                    call_args.push(CallArgument::builder().value(value.clone()).build());
                }
            }
        }

        match anchor {
            Some(object_id) => {
                let params = CallFunctionOnParams::builder()
                    .function_declaration(declaration)
                    .object_id(object_id)
                    .arguments(call_args)
                    .return_by_value(true)
                    .build()
                    .map_err(DriverError::Script)?;
                let response = match self.page.execute(params).await {
                    Ok(response) => response,
                    Err(err) => return Err(self.page_error("execute_script", err)),
                };
                if let Some(details) = &response.result.exception_details {
                    return Err(DriverError::Script(details.text.clone()));
                }
                Ok(response.result.result.value.clone().unwrap_or(Value::Null))
            }
            None => {
                let values: Vec<Value> = args
                    .iter()
                    .filter_map(|arg| match arg {
                        ScriptArg::Value(value) => Some(value.clone()),
                        ScriptArg::Element(_) => None,
                    })
                    .collect();
                let expression = format!(
                    "({declaration}).apply(null, {})",
                    serde_json::to_string(&values).map_err(DriverError::protocol)?
                );
                match self.page.evaluate(expression).await {
                    Ok(result) => Ok(result.value().cloned().unwrap_or(Value::Null)),
                    Err(err) => {
                        metrics::record_command_failure("execute_script");
                        Err(DriverError::Script(err.to_string()))
                    }
                }
            }
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.ensure_open()?;
        match self.page.url().await {
            Ok(url) => Ok(url.unwrap_or_default()),
            Err(err) => Err(self.page_error("current_url", err)),
        }
    }

    async fn page_content(&self) -> Result<String, DriverError> {
        self.ensure_open()?;
        match self.page.content().await {
            Ok(content) => Ok(content),
            Err(err) => Err(self.page_error("page_content", err)),
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.ensure_open()?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        match self.page.screenshot(params).await {
            Ok(bytes) => Ok(bytes),
            Err(err) => Err(self.page_error("screenshot", err)),
        }
    }

    async fn quit(&self) -> Result<(), DriverError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.elements.clear();

        let mut result = Ok(());
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(err) = browser.close().await {
                warn!(target: "cdp-adapter", ?err, "browser close failed");
                result = Err(DriverError::protocol(err));
            }
            if let Err(err) = browser.wait().await {
                warn!(target: "cdp-adapter", ?err, "waiting for browser exit failed");
            }
        }

        let handler = self
            .handler
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(handler) = handler {
            handler.abort();
        }
        result
    }
}
