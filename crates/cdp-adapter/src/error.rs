use thiserror::Error;

/// Errors raised by a browser driver backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The browser process could not be started or configured.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// A DevTools command failed or returned an unexpected payload.
    #[error("cdp protocol error: {0}")]
    Protocol(String),

    /// The handle no longer refers to a live element.
    #[error("stale element handle #{0}")]
    StaleElement(u64),

    /// The element exists but cannot receive the interaction.
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    /// Injected script threw or returned something unusable.
    #[error("script error: {0}")]
    Script(String),

    /// The session has already been quit.
    #[error("browser session closed")]
    Closed,
}

impl DriverError {
    pub fn protocol(err: impl std::fmt::Display) -> Self {
        DriverError::Protocol(err.to_string())
    }

    /// Transient conditions a polling wait may retry through.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DriverError::StaleElement(_) | DriverError::NotInteractable(_)
        )
    }
}
