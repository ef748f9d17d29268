//! In-memory browser for tests.
//!
//! A [`ScriptedBrowser`] holds a flat list of elements keyed by the locator
//! that finds them. Tests wire reactions to clicks, keystrokes, scripts and
//! navigation, optionally delayed, to model how the real application responds.
//! Every driver call is recorded so assertions can check what a flow did.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::driver::{BrowserDriver, ElementHandle, ScriptArg};
use crate::error::DriverError;
use crate::locator::Locator;
use crate::session::{SessionConfig, SessionLauncher};

pub type ElementId = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedElement {
    pub locator: Locator,
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub visible: bool,
    pub enabled: bool,
    pub attached: bool,
}

impl ScriptedElement {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            text: String::new(),
            attributes: HashMap::new(),
            visible: true,
            enabled: true,
            attached: true,
        }
    }

    /// A text input, with an empty `value`.
    pub fn input(locator: Locator) -> Self {
        Self::new(locator).with_attr("value", "")
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }
}

/// Page state visible to reactions.
#[derive(Debug, Default)]
pub struct ScriptedPage {
    pub url: String,
    pub content: String,
    elements: BTreeMap<ElementId, ScriptedElement>,
    next_id: ElementId,
}

impl ScriptedPage {
    pub fn add(&mut self, element: ScriptedElement) -> ElementId {
        self.next_id += 1;
        self.elements.insert(self.next_id, element);
        self.next_id
    }

    pub fn element(&self, id: ElementId) -> Option<&ScriptedElement> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut ScriptedElement> {
        self.elements.get_mut(&id)
    }

    /// Attaches and shows the element.
    pub fn show(&mut self, id: ElementId) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.attached = true;
            element.visible = true;
        }
    }

    pub fn hide(&mut self, id: ElementId) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.visible = false;
        }
    }

    /// Removes the element from the document; existing handles go stale.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.attached = false;
        }
    }

    pub fn detach_matching(&mut self, locator: &Locator) {
        for element in self.elements.values_mut() {
            if &element.locator == locator {
                element.attached = false;
            }
        }
    }

    pub fn set_attr(&mut self, id: ElementId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn attr(&self, id: ElementId, name: &str) -> Option<String> {
        self.elements
            .get(&id)
            .and_then(|element| element.attributes.get(name).cloned())
    }

    pub fn value(&self, id: ElementId) -> String {
        self.attr(id, "value").unwrap_or_default()
    }

    /// Attached elements matching the locator, in insertion order.
    pub fn find_ids(&self, locator: &Locator) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, element)| element.attached && &element.locator == locator)
            .map(|(id, _)| *id)
            .collect()
    }

    fn live(&self, id: ElementId) -> Result<&ScriptedElement, DriverError> {
        self.elements
            .get(&id)
            .filter(|element| element.attached)
            .ok_or(DriverError::StaleElement(id))
    }
}

pub type Reaction = Arc<dyn Fn(&mut ScriptedPage) + Send + Sync>;
pub type KeysReaction = Arc<dyn Fn(&mut ScriptedPage, &str) + Send + Sync>;
pub type NavigateReaction = Arc<dyn Fn(&mut ScriptedPage, &str) + Send + Sync>;
pub type ScriptHandler =
    Arc<dyn Fn(&mut ScriptedPage, &str, &[ScriptArg]) -> Result<Value, DriverError> + Send + Sync>;

/// Driver call as observed by the scripted browser.
#[derive(Clone, Debug, PartialEq)]
pub enum DriverCall {
    Navigate(String),
    Click(Locator),
    Clear(Locator),
    SendKeys(Locator, String),
    Script(String),
    Screenshot,
    PageContent,
    Quit,
}

#[derive(Default)]
struct Inner {
    page: ScriptedPage,
    on_click: HashMap<ElementId, Vec<(Duration, Reaction)>>,
    on_keys: HashMap<ElementId, Vec<KeysReaction>>,
    on_navigate: Vec<NavigateReaction>,
    on_script: Option<ScriptHandler>,
    pending: Vec<(Instant, Reaction)>,
    calls: Vec<DriverCall>,
    quit_count: usize,
}

impl Inner {
    /// Applies delayed reactions that have come due, oldest first.
    fn settle(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let now = Instant::now();
        self.pending.sort_by_key(|(due, _)| *due);
        let split = self.pending.partition_point(|(due, _)| *due <= now);
        let due: Vec<_> = self.pending.drain(..split).collect();
        for (_, reaction) in due {
            reaction(&mut self.page);
        }
    }

    fn schedule(&mut self, delay: Duration, reaction: Reaction) {
        if delay.is_zero() {
            reaction(&mut self.page);
        } else {
            self.pending.push((Instant::now() + delay, reaction));
        }
    }
}

#[derive(Default)]
pub struct ScriptedBrowser {
    inner: Mutex<Inner>,
}

impl ScriptedBrowser {
    pub fn new(url: impl Into<String>) -> Arc<Self> {
        let browser = Self::default();
        browser.lock().page.url = url.into();
        Arc::new(browser)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn add(&self, element: ScriptedElement) -> ElementId {
        self.lock().page.add(element)
    }

    pub fn on_click<F>(&self, id: ElementId, reaction: F)
    where
        F: Fn(&mut ScriptedPage) + Send + Sync + 'static,
    {
        self.on_click_after(id, Duration::ZERO, reaction);
    }

    /// Runs `reaction` once `delay` has elapsed after each click.
    pub fn on_click_after<F>(&self, id: ElementId, delay: Duration, reaction: F)
    where
        F: Fn(&mut ScriptedPage) + Send + Sync + 'static,
    {
        self.lock()
            .on_click
            .entry(id)
            .or_default()
            .push((delay, Arc::new(reaction)));
    }

    pub fn on_keys<F>(&self, id: ElementId, reaction: F)
    where
        F: Fn(&mut ScriptedPage, &str) + Send + Sync + 'static,
    {
        self.lock()
            .on_keys
            .entry(id)
            .or_default()
            .push(Arc::new(reaction));
    }

    pub fn on_navigate<F>(&self, reaction: F)
    where
        F: Fn(&mut ScriptedPage, &str) + Send + Sync + 'static,
    {
        self.lock().on_navigate.push(Arc::new(reaction));
    }

    pub fn on_script<F>(&self, handler: F)
    where
        F: Fn(&mut ScriptedPage, &str, &[ScriptArg]) -> Result<Value, DriverError>
            + Send
            + Sync
            + 'static,
    {
        self.lock().on_script = Some(Arc::new(handler));
    }

    /// Runs `reaction` against the page after `delay`, independent of any call.
    pub fn after<F>(&self, delay: Duration, reaction: F)
    where
        F: Fn(&mut ScriptedPage) + Send + Sync + 'static,
    {
        self.lock().schedule(delay, Arc::new(reaction));
    }

    pub fn with_page<R>(&self, f: impl FnOnce(&mut ScriptedPage) -> R) -> R {
        let mut inner = self.lock();
        inner.settle();
        f(&mut inner.page)
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    pub fn clicked(&self, locator: &Locator) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, DriverCall::Click(l) if l == locator))
            .count()
    }

    pub fn quit_count(&self) -> usize {
        self.lock().quit_count
    }

    pub fn is_quit(&self) -> bool {
        self.quit_count() > 0
    }

    fn locator_of(inner: &Inner, handle: &ElementHandle) -> Result<Locator, DriverError> {
        inner
            .page
            .live(handle.id())
            .map(|element| element.locator.clone())
    }
}

#[async_trait]
impl BrowserDriver for ScriptedBrowser {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.settle();
        inner.calls.push(DriverCall::Navigate(url.to_string()));
        inner.page.url = url.to_string();
        let reactions = inner.on_navigate.clone();
        for reaction in reactions {
            reaction(&mut inner.page, url);
        }
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError> {
        Ok(self.find_all(locator).await?.into_iter().next())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        let mut inner = self.lock();
        inner.settle();
        Ok(inner
            .page
            .find_ids(locator)
            .into_iter()
            .map(ElementHandle::new)
            .collect())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.settle();
        let target = inner.page.live(element.id())?;
        if !target.visible || !target.enabled {
            return Err(DriverError::NotInteractable(target.locator.to_string()));
        }
        let locator = target.locator.clone();
        inner.calls.push(DriverCall::Click(locator));
        let reactions = inner.on_click.get(&element.id()).cloned().unwrap_or_default();
        for (delay, reaction) in reactions {
            inner.schedule(delay, reaction);
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.settle();
        let locator = Self::locator_of(&inner, element)?;
        inner.calls.push(DriverCall::Clear(locator));
        inner.page.set_attr(element.id(), "value", "");
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.settle();
        let target = inner.page.live(element.id())?;
        if !target.visible || !target.enabled {
            return Err(DriverError::NotInteractable(target.locator.to_string()));
        }
        let locator = target.locator.clone();
        inner
            .calls
            .push(DriverCall::SendKeys(locator, text.to_string()));
        let current = inner.page.value(element.id());
        inner
            .page
            .set_attr(element.id(), "value", format!("{current}{text}"));
        let reactions = inner.on_keys.get(&element.id()).cloned().unwrap_or_default();
        for reaction in reactions {
            reaction(&mut inner.page, text);
        }
        Ok(())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let mut inner = self.lock();
        inner.settle();
        let target = inner.page.live(element.id())?;
        Ok(target.attributes.get(name).cloned())
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, DriverError> {
        let mut inner = self.lock();
        inner.settle();
        Ok(inner.page.live(element.id())?.text.clone())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        let mut inner = self.lock();
        inner.settle();
        Ok(inner.page.live(element.id())?.visible)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        let mut inner = self.lock();
        inner.settle();
        Ok(inner.page.live(element.id())?.enabled)
    }

    async fn execute_script(
        &self,
        script: &str,
        args: &[ScriptArg],
    ) -> Result<Value, DriverError> {
        let mut inner = self.lock();
        inner.settle();
        inner.calls.push(DriverCall::Script(script.to_string()));
        for arg in args {
            if let ScriptArg::Element(handle) = arg {
                inner.page.live(handle.id())?;
            }
        }
        match inner.on_script.clone() {
            Some(handler) => handler(&mut inner.page, script, args),
            None => Ok(Value::Null),
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let mut inner = self.lock();
        inner.settle();
        Ok(inner.page.url.clone())
    }

    async fn page_content(&self) -> Result<String, DriverError> {
        let mut inner = self.lock();
        inner.settle();
        inner.calls.push(DriverCall::PageContent);
        Ok(inner.page.content.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let mut inner = self.lock();
        inner.calls.push(DriverCall::Screenshot);
        Ok(b"\x89PNG\r\n\x1a\nscripted".to_vec())
    }

    async fn quit(&self) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.quit_count += 1;
        inner.calls.push(DriverCall::Quit);
        Ok(())
    }
}

/// Hands out the same scripted browser on every launch.
pub struct ScriptedLauncher {
    browser: Arc<ScriptedBrowser>,
    launches: AtomicUsize,
    fail_with: Option<DriverError>,
}

impl ScriptedLauncher {
    pub fn new(browser: Arc<ScriptedBrowser>) -> Self {
        Self {
            browser,
            launches: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    /// A launcher whose every launch fails with `error`.
    pub fn failing(error: DriverError) -> Self {
        Self {
            browser: ScriptedBrowser::new("about:blank"),
            launches: AtomicUsize::new(0),
            fail_with: Some(error),
        }
    }

    pub fn browser(&self) -> &Arc<ScriptedBrowser> {
        &self.browser
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for ScriptedLauncher {
    fn backend(&self) -> &'static str {
        "scripted"
    }

    async fn launch(&self, _config: &SessionConfig) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(self.browser.clone() as Arc<dyn BrowserDriver>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn click_reactions_apply_after_delay() {
        let browser = ScriptedBrowser::new("https://hrm.test");
        let button = browser.add(ScriptedElement::new(Locator::css("button")));
        let toast = browser.add(ScriptedElement::new(Locator::css(".toast")).hidden());
        browser.on_click_after(button, Duration::from_millis(30), move |page| page.show(toast));

        let handle = browser.find(&Locator::css("button")).await.unwrap().unwrap();
        browser.click(&handle).await.unwrap();
        let toast_handle = browser.find(&Locator::css(".toast")).await.unwrap().unwrap();
        assert!(!browser.is_displayed(&toast_handle).await.unwrap());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(browser.is_displayed(&toast_handle).await.unwrap());
        assert_eq!(browser.clicked(&Locator::css("button")), 1);
    }

    #[tokio::test]
    async fn detached_elements_are_stale_and_not_found() {
        let browser = ScriptedBrowser::new("about:blank");
        let id = browser.add(ScriptedElement::new(Locator::css(".spinner")));
        let handle = browser.find(&Locator::css(".spinner")).await.unwrap().unwrap();
        browser.with_page(|page| page.detach(id));

        assert_eq!(
            browser.is_displayed(&handle).await,
            Err(DriverError::StaleElement(id))
        );
        assert!(browser.find(&Locator::css(".spinner")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn typing_appends_to_value() {
        let browser = ScriptedBrowser::new("about:blank");
        browser.add(ScriptedElement::input(Locator::name("firstName")));
        let handle = browser
            .find(&Locator::name("firstName"))
            .await
            .unwrap()
            .unwrap();
        browser.send_keys(&handle, "Ja").await.unwrap();
        browser.send_keys(&handle, "ne").await.unwrap();
        assert_eq!(
            browser.attribute(&handle, "value").await.unwrap().as_deref(),
            Some("Jane")
        );
        browser.clear(&handle).await.unwrap();
        assert_eq!(
            browser.attribute(&handle, "value").await.unwrap().as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn hidden_elements_reject_clicks() {
        let browser = ScriptedBrowser::new("about:blank");
        browser.add(ScriptedElement::new(Locator::css("a")).hidden());
        let handle = browser.find(&Locator::css("a")).await.unwrap().unwrap();
        assert!(matches!(
            browser.click(&handle).await,
            Err(DriverError::NotInteractable(_))
        ));
    }

    #[tokio::test]
    async fn launcher_counts_launches_and_hands_out_the_same_browser() {
        let browser = ScriptedBrowser::new("about:blank");
        let launcher = ScriptedLauncher::new(browser.clone());
        let driver = launcher.launch(&SessionConfig::default()).await.unwrap();
        driver.quit().await.unwrap();
        assert_eq!(launcher.launches(), 1);
        assert!(browser.is_quit());

        let failing = ScriptedLauncher::failing(DriverError::Launch("no chrome".into()));
        assert!(failing.launch(&SessionConfig::default()).await.is_err());
        assert_eq!(failing.launches(), 1);
    }
}
