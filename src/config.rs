//! Application configuration.
//!
//! Loaded from YAML with every field defaulted, then overridden from `HRM_*`
//! environment variables, then validated once before anything runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use action_flow::{FlowKit, FlowSettings, PageCatalog};
use action_primitives::{Diagnostics, SettlePauses};
use cdp_adapter::SessionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const REDACTED: &str = "********";
/// Upper bound for `browser.timeout_secs`.
const MAX_TIMEOUT_SECS: u64 = 3_600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target: TargetConfig,
    pub browser: BrowserConfig,
    pub workflow: WorkflowConfig,
    pub store: StoreConfig,
    pub server: ServerConfig,
    /// Replaces the built-in OrangeHRM locator catalog; unspecified entries keep their defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locators: Option<PageCatalog>,
}

/// The application under automation and the operator credentials for it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://opensource-demo.orangehrmlive.com".to_string(),
            username: "Admin".to_string(),
            password: "admin123".to_string(),
        }
    }
}

impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub timeout_secs: u64,
    pub window_width: u32,
    pub window_height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_secs: 30,
            window_width: 1920,
            window_height: 1080,
            executable: None,
            extra_args: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub allow_duplicates: bool,
    pub case_sensitive: bool,
    /// Wait for a success indicator after saving job details.
    pub confirm_job_save: bool,
    pub diagnostics_dir: PathBuf,
    pub poll_interval_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            allow_duplicates: false,
            case_sensitive: false,
            confirm_job_save: true,
            diagnostics_dir: PathBuf::from("diagnostics"),
            poll_interval_ms: 100,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub enabled: bool,
    pub database_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_url: "sqlite://employees.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies `HRM_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("HRM_BASE_URL") {
            self.target.base_url = value;
        }
        if let Some(value) = lookup("HRM_USERNAME") {
            self.target.username = value;
        }
        if let Some(value) = lookup("HRM_PASSWORD") {
            self.target.password = value;
        }
        if let Some(value) = lookup("HRM_TIMEOUT_SECS") {
            self.browser.timeout_secs = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "HRM_TIMEOUT_SECS".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("HRM_HEADLESS") {
            self.browser.headless = parse_flag("HRM_HEADLESS", &value)?;
        }
        if let Some(value) = lookup("HRM_USE_STORE") {
            self.store.enabled = parse_flag("HRM_USE_STORE", &value)?;
        }
        if let Some(value) = lookup("HRM_ALLOW_DUPLICATES") {
            self.workflow.allow_duplicates = parse_flag("HRM_ALLOW_DUPLICATES", &value)?;
        }
        if let Some(value) = lookup("HRM_CASE_SENSITIVE") {
            self.workflow.case_sensitive = parse_flag("HRM_CASE_SENSITIVE", &value)?;
        }
        if let Some(value) = lookup("HRM_DATABASE_URL") {
            self.store.database_url = value;
        }
        if let Some(value) = lookup("HRM_DIAGNOSTICS_DIR") {
            self.workflow.diagnostics_dir = PathBuf::from(value);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.browser.timeout_secs == 0 || self.browser.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "browser.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        if self.workflow.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "workflow.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Url::parse(&self.target.base_url).map_err(|err| ConfigError::InvalidValue {
            key: "target.base_url".to_string(),
            value: format!("{} ({err})", self.target.base_url),
        })?;
        if self.target.username.trim().is_empty() || self.target.password.is_empty() {
            return Err(ConfigError::Invalid(
                "target.username and target.password are required".to_string(),
            ));
        }
        if self.store.enabled && self.store.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.database_url is required when the store is enabled".to_string(),
            ));
        }
        FlowKit::validate_catalog(&self.catalog())
            .map_err(|err| ConfigError::Invalid(format!("locator pattern: {err}")))?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.browser.timeout_secs)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            headless: self.browser.headless,
            timeout: self.timeout(),
            window_width: self.browser.window_width,
            window_height: self.browser.window_height,
            executable: self.browser.executable.clone(),
            extra_args: self.browser.extra_args.clone(),
        }
    }

    pub fn catalog(&self) -> PageCatalog {
        self.locators.clone().unwrap_or_default()
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            timeout: self.timeout(),
            poll_interval: Duration::from_millis(self.workflow.poll_interval_ms),
            case_sensitive: self.workflow.case_sensitive,
            confirm_job_save: self.workflow.confirm_job_save,
            pauses: SettlePauses::default(),
            diagnostics: Diagnostics::new(self.workflow.diagnostics_dir.clone()),
            ..FlowSettings::default()
        }
    }

    pub fn flow_kit(&self) -> FlowKit {
        FlowKit::new(Arc::new(self.catalog()), self.flow_settings())
    }

    /// Copy safe to print: the operator password is masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.target.password = REDACTED.to_string();
        config
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
