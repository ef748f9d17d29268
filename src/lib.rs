//! hrm-autopilot
//!
//! Drives OrangeHRM through its web UI to onboard employees and file expense
//! claims. The workflow engine lives in the `action-flow` crate; this crate
//! wires it to configuration, an identity store, an HTTP API and a CLI.

pub mod cli;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod orchestrator;
pub mod server;

pub use config::{AppConfig, ConfigError};
pub use errors::{ApiError, Envelope};
pub use orchestrator::{Clock, FixedClock, SystemClock, WorkflowOrchestrator};
pub use server::{build_router, ServeState};
