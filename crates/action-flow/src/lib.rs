//! Business flows over a live browser session.
//!
//! Each flow borrows a [`FlowKit`] (locator catalog plus the waiting,
//! dropdown and outcome primitives built from it) and drives one authenticated
//! [`cdp_adapter::BrowserDriver`]. Flows never retry; every failure leaves
//! the flow as a typed [`hrm_core_types::Failure`].

pub mod claim;
pub mod employee;
pub mod errors;
pub mod ids;
pub mod kit;
pub mod locators;
pub mod login;
#[cfg(any(test, feature = "scripted"))]
pub mod testing;

pub use claim::ClaimCreationFlow;
pub use employee::{EmployeeCreationFlow, JOIN_DATE_FORMAT};
pub use errors::FlowError;
pub use ids::{IdCandidateSource, RandomIdCandidates, SequenceIdCandidates};
pub use kit::{FlowKit, FlowSettings};
pub use locators::PageCatalog;
pub use login::LoginFlow;
