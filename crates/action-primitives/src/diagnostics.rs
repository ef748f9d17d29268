//! Post-mortem capture taken when a submission produces no terminal signal.

use std::path::PathBuf;

use cdp_adapter::BrowserDriver;
use chrono::Local;
use tracing::{info, warn};

pub const PAGE_SNIPPET_LIMIT: usize = 2000;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub screenshot: Option<PathBuf>,
    pub url: Option<String>,
    pub page_snippet: Option<String>,
}

/// Screenshot and page-content capture. Never fails: capture problems are
/// logged and the report is simply thinner.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    dir: Option<PathBuf>,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Logs page state but writes no files.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub async fn capture(&self, driver: &dyn BrowserDriver, label: &str) -> DiagnosticReport {
        let mut report = DiagnosticReport {
            url: driver.current_url().await.ok(),
            ..DiagnosticReport::default()
        };

        if let Some(dir) = &self.dir {
            match driver.screenshot().await {
                Ok(bytes) => {
                    let file = dir.join(format!(
                        "{label}_{}.png",
                        Local::now().format("%Y%m%d_%H%M%S")
                    ));
                    let written = async {
                        tokio::fs::create_dir_all(dir).await?;
                        tokio::fs::write(&file, bytes).await
                    }
                    .await;
                    match written {
                        Ok(()) => report.screenshot = Some(file),
                        Err(err) => warn!(path = %file.display(), error = %err, "failed to save screenshot"),
                    }
                }
                Err(err) => warn!(error = %err, "screenshot capture failed"),
            }
        }

        match driver.page_content().await {
            Ok(content) => {
                let snippet: String = content.chars().take(PAGE_SNIPPET_LIMIT).collect();
                report.page_snippet = Some(snippet);
            }
            Err(err) => warn!(error = %err, "page content capture failed"),
        }

        info!(
            label = %label,
            url = report.url.as_deref().unwrap_or(""),
            screenshot = ?report.screenshot,
            page_snippet = report.page_snippet.as_deref().unwrap_or(""),
            "captured diagnostics"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::scripted::ScriptedBrowser;

    #[tokio::test]
    async fn writes_screenshot_and_truncates_content() {
        let dir = tempfile::tempdir().unwrap();
        let browser = ScriptedBrowser::new("https://hrm.test/claim");
        browser.with_page(|page| page.content = "é".repeat(PAGE_SNIPPET_LIMIT + 50));

        let report = Diagnostics::new(dir.path().join("diag"))
            .capture(&*browser, "claim_navigation_error")
            .await;

        let shot = report.screenshot.expect("screenshot saved");
        assert!(shot.exists());
        assert!(shot
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap()
            .starts_with("claim_navigation_error_"));
        assert_eq!(
            report.page_snippet.unwrap().chars().count(),
            PAGE_SNIPPET_LIMIT
        );
        assert_eq!(report.url.as_deref(), Some("https://hrm.test/claim"));
    }

    #[tokio::test]
    async fn disabled_capture_writes_nothing() {
        let browser = ScriptedBrowser::new("about:blank");
        let report = Diagnostics::disabled().capture(&*browser, "x").await;
        assert!(report.screenshot.is_none());
        assert_eq!(report.page_snippet.as_deref(), Some(""));
    }
}
