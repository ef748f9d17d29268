//! Action primitives shared by every workflow
//!
//! - bounded polling waits (`WaitStrategy`, `PollingWait`, `Waiter`)
//! - named settle pauses for transitions with no observable completion
//! - label-based dropdown resolution
//! - outcome detection after a submission, with diagnostic capture on timeout

pub mod diagnostics;
pub mod dropdown;
pub mod errors;
pub mod outcome;
pub mod settle;
mod waiting;

pub use diagnostics::{DiagnosticReport, Diagnostics};
pub use dropdown::{labels_match, DropdownResolver};
pub use errors::*;
pub use outcome::{Confirmation, Outcome, OutcomeDetector, OutcomeSignals, Signal};
pub use settle::{settle, SettlePauses};
pub use waiting::*;
