use anyhow::Result;
use clap::{Args, Subcommand};
use hrm_core_types::{CreateEmployeeRequest, JobInfo};
use serde_json::json;

use super::context::CliContext;
use super::output::print_outcome;

#[derive(Args, Clone, Debug)]
pub struct EmployeeArgs {
    #[command(subcommand)]
    pub action: EmployeeAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum EmployeeAction {
    /// Create an employee and fill in their job details
    Add(AddEmployeeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct AddEmployeeArgs {
    #[arg(long)]
    pub first: String,

    #[arg(long)]
    pub middle: Option<String>,

    #[arg(long)]
    pub last: String,

    #[arg(long)]
    pub job_title: String,

    #[arg(long)]
    pub job_category: String,

    #[arg(long)]
    pub sub_unit: String,

    #[arg(long)]
    pub location: String,

    #[arg(long)]
    pub employment_status: String,
}

impl AddEmployeeArgs {
    pub fn into_request(self) -> CreateEmployeeRequest {
        CreateEmployeeRequest {
            first_name: self.first,
            middle_name: self.middle,
            last_name: self.last,
            job: JobInfo {
                job_title: self.job_title,
                job_category: self.job_category,
                sub_unit: self.sub_unit,
                location: self.location,
                employment_status: self.employment_status,
            },
        }
    }
}

pub async fn cmd_employee(args: EmployeeArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        EmployeeAction::Add(add) => {
            let orchestrator = ctx.orchestrator().await?;
            let outcome = orchestrator
                .create_employee(add.into_request())
                .await
                .map(|employee_id| json!({ "employeeId": employee_id }));
            print_outcome(&outcome)
        }
    }
}
