use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use cdp_adapter::ChromiumLauncher;
use identity_store::{IdentityStore, SqliteIdentityStore};
use tracing::info;

use crate::config::AppConfig;
use crate::orchestrator::WorkflowOrchestrator;

pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Opens the identity store when enabled.
    pub async fn identity_store(&self) -> Result<Option<Arc<dyn IdentityStore>>> {
        let store = &self.config.store;
        if !store.enabled {
            info!("identity store disabled; duplicate check and id lookup are off");
            return Ok(None);
        }
        let sqlite = SqliteIdentityStore::open(&store.database_url)
            .await
            .with_context(|| format!("Failed to open identity store {}", store.database_url))?;
        Ok(Some(Arc::new(sqlite)))
    }

    /// Orchestrator driving a real Chromium.
    pub async fn orchestrator(&self) -> Result<Arc<WorkflowOrchestrator>> {
        let store = self.identity_store().await?;
        Ok(Arc::new(WorkflowOrchestrator::from_config(
            self.config(),
            Arc::new(ChromiumLauncher),
            store,
        )))
    }
}
