//! Custom dropdown option resolution by label.

use cdp_adapter::{BrowserDriver, ElementHandle, Locator};
use tracing::{debug, info, warn};

use crate::errors::ActionError;
use crate::settle::{settle, SettlePauses};
use crate::waiting::Waiter;

/// Label comparison used for dropdown options: exact, or ordinal ignoring case.
///
/// The case-insensitive form compares char by char after simple uppercase
/// mapping. A char whose uppercase form is more than one char (`ß`) is kept
/// as is, and compatibility chars such as the Kelvin sign do not fold onto
/// ASCII letters.
pub fn labels_match(candidate: &str, wanted: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        candidate == wanted
    } else {
        candidate.chars().map(simple_upper).eq(wanted.chars().map(simple_upper))
    }
}

fn simple_upper(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(mapped), None) => mapped,
        _ => c,
    }
}

/// Opens a dropdown, scans its options and clicks the first one whose trimmed
/// text equals the wanted label.
#[derive(Clone, Debug)]
pub struct DropdownResolver {
    options: Locator,
    dismiss: Locator,
    waiter: Waiter,
    pauses: SettlePauses,
}

impl DropdownResolver {
    pub fn new(options: Locator, dismiss: Locator, waiter: Waiter, pauses: SettlePauses) -> Self {
        Self {
            options,
            dismiss,
            waiter,
            pauses,
        }
    }

    /// Returns `Ok(false)` when no option matches; the list is closed again
    /// before returning in that case and on every error path.
    pub async fn select(
        &self,
        driver: &dyn BrowserDriver,
        dropdown: &ElementHandle,
        label: &str,
        case_sensitive: bool,
    ) -> Result<bool, ActionError> {
        info!(label = %label, case_sensitive, "selecting dropdown option");
        match self.scan(driver, dropdown, label, case_sensitive).await {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.dismiss(driver).await;
                Ok(false)
            }
            Err(err) => {
                warn!(label = %label, error = %err, "dropdown selection failed");
                self.dismiss(driver).await;
                Err(err)
            }
        }
    }

    async fn scan(
        &self,
        driver: &dyn BrowserDriver,
        dropdown: &ElementHandle,
        label: &str,
        case_sensitive: bool,
    ) -> Result<bool, ActionError> {
        driver.click(dropdown).await?;
        settle(self.pauses.after_dropdown_open).await;

        // An option list that never populates has no matching option.
        if let Err(err) = self.waiter.present(driver, &self.options).await {
            return match err {
                ActionError::WaitTimeout(_) => Ok(false),
                other => Err(other),
            };
        }

        let options = driver.find_all(&self.options).await?;
        let mut seen = Vec::with_capacity(options.len());
        for option in options {
            let text = driver.text(&option).await?;
            let text = text.trim();
            if labels_match(text, label, case_sensitive) {
                driver.click(&option).await?;
                settle(self.pauses.after_option_click).await;
                info!(label = %label, "dropdown option selected");
                return Ok(true);
            }
            seen.push(text.to_string());
        }

        info!(label = %label, available = %seen.join(", "), "no dropdown option matched");
        Ok(false)
    }

    async fn dismiss(&self, driver: &dyn BrowserDriver) {
        match driver.find(&self.dismiss).await {
            Ok(Some(target)) => {
                if let Err(err) = driver.click(&target).await {
                    warn!(error = %err, "failed to dismiss dropdown");
                }
            }
            Ok(None) => warn!(locator = %self.dismiss, "dismiss target not found"),
            Err(err) => warn!(error = %err, "failed to locate dismiss target"),
        }
        let closing = self.waiter.with_limit(self.pauses.after_dropdown_open.max(
            self.waiter.poll_interval() * 10,
        ));
        if closing.hidden(driver, &self.options).await.is_err() {
            warn!(locator = %self.options, "dropdown options still displayed after dismiss");
        } else {
            debug!("dropdown dismissed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use cdp_adapter::scripted::{ScriptedBrowser, ScriptedElement};

    const OPTION: &str = ".oxd-select-option";

    fn resolver() -> DropdownResolver {
        DropdownResolver::new(
            Locator::css(OPTION),
            Locator::css("body"),
            Waiter::polling(Duration::from_millis(200), Duration::from_millis(5)),
            SettlePauses::none(),
        )
    }

    /// A closed dropdown whose options appear on click and disappear on body click.
    fn dropdown(labels: &[&str]) -> (Arc<ScriptedBrowser>, ElementHandle, Vec<u64>) {
        let browser = ScriptedBrowser::new("about:blank");
        let body = browser.add(ScriptedElement::new(Locator::css("body")));
        let select = browser.add(ScriptedElement::new(Locator::css(".oxd-select-text-input")));
        let options: Vec<u64> = labels
            .iter()
            .map(|label| {
                browser.add(
                    ScriptedElement::new(Locator::css(OPTION))
                        .with_text(format!("  {label} "))
                        .detached(),
                )
            })
            .collect();
        let open = options.clone();
        browser.on_click(select, move |page| open.iter().for_each(|id| page.show(*id)));
        for id in &options {
            let all = options.clone();
            browser.on_click(*id, move |page| all.iter().for_each(|id| page.detach(*id)));
        }
        let all = options.clone();
        browser.on_click(body, move |page| all.iter().for_each(|id| page.detach(*id)));
        (browser, ElementHandle::new(select), options)
    }

    fn open_options(browser: &ScriptedBrowser) -> usize {
        browser.with_page(|page| page.find_ids(&Locator::css(OPTION)).len())
    }

    #[test]
    fn case_folding_only_when_insensitive() {
        assert!(labels_match("Full-Time Permanent", "full-time permanent", false));
        assert!(!labels_match("Full-Time Permanent", "full-time permanent", true));
        assert!(labels_match("Euro", "Euro", true));
        assert!(!labels_match("Euro", "Eur", false));
    }

    #[test]
    fn case_folding_is_ordinal() {
        assert!(labels_match("Österreich", "öSTERREICH", false));
        assert!(!labels_match("\u{212A}elvin", "kelvin", false));
        assert!(!labels_match("Straße", "STRASSE", false));
    }

    #[tokio::test]
    async fn selects_first_match_ignoring_case() {
        let (browser, select, _) = dropdown(&["-- Select --", "QA Engineer", "qa engineer"]);
        let selected = resolver()
            .select(&*browser, &select, "QA ENGINEER", false)
            .await
            .unwrap();
        assert!(selected);
        assert_eq!(browser.clicked(&Locator::css(OPTION)), 1);
        assert_eq!(browser.clicked(&Locator::css("body")), 0);
        assert_eq!(open_options(&browser), 0);
    }

    #[tokio::test]
    async fn case_sensitive_mismatch_closes_the_list() {
        let (browser, select, _) = dropdown(&["Euro", "United States Dollar"]);
        let selected = resolver()
            .select(&*browser, &select, "euro", true)
            .await
            .unwrap();
        assert!(!selected);
        assert_eq!(browser.clicked(&Locator::css("body")), 1);
        assert_eq!(open_options(&browser), 0);
    }

    #[tokio::test]
    async fn empty_list_reports_no_match() {
        let (browser, select, _) = dropdown(&[]);
        let selected = resolver()
            .select(&*browser, &select, "Euro", false)
            .await
            .unwrap();
        assert!(!selected);
        assert_eq!(browser.clicked(&Locator::css("body")), 1);
    }
}
