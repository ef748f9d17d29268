use clap::Subcommand;

use super::claim::ClaimArgs;
use super::config::ConfigArgs;
use super::employee::EmployeeArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Serve the workflow API over HTTP
    Serve(ServeArgs),

    /// Employee workflows
    Employee(EmployeeArgs),

    /// Expense claim workflows
    Claim(ClaimArgs),

    /// Inspect configuration
    Config(ConfigArgs),
}
