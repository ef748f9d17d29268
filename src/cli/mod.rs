pub mod app;
pub mod claim;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod employee;
pub mod env;
pub mod output;
pub mod runtime;
pub mod serve;

pub use app::run;
pub use claim::{cmd_claim, ClaimArgs};
pub use employee::{cmd_employee, EmployeeArgs};
pub use serve::{cmd_serve, ServeArgs};
