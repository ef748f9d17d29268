use anyhow::Result;
use clap::{Args, Subcommand};
use hrm_core_types::CreateClaimRequest;
use serde_json::json;

use super::context::CliContext;
use super::output::print_outcome;

#[derive(Args, Clone, Debug)]
pub struct ClaimArgs {
    #[command(subcommand)]
    pub action: ClaimAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ClaimAction {
    /// Assign an expense claim to an employee
    Create(CreateClaimArgs),
}

#[derive(Args, Clone, Debug)]
#[command(group(
    clap::ArgGroup::new("employee")
        .required(true)
        .args(["employee_id", "employee_name"]),
))]
pub struct CreateClaimArgs {
    /// Employee id recorded by a previous `employee add` (needs the identity store)
    #[arg(long)]
    pub employee_id: Option<String>,

    /// Display name as shown in the employee search
    #[arg(long)]
    pub employee_name: Option<String>,

    #[arg(long)]
    pub event: String,

    #[arg(long)]
    pub currency: String,

    #[arg(long)]
    pub remarks: Option<String>,
}

impl CreateClaimArgs {
    pub fn into_request(self) -> CreateClaimRequest {
        CreateClaimRequest {
            employee_id: self.employee_id,
            employee_name: self.employee_name,
            event: self.event,
            currency: self.currency,
            remarks: self.remarks,
        }
    }
}

pub async fn cmd_claim(args: ClaimArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ClaimAction::Create(create) => {
            let orchestrator = ctx.orchestrator().await?;
            let outcome = orchestrator
                .create_claim(create.into_request())
                .await
                .map(|result| json!({ "referenceId": result.reference_id }));
            print_outcome(&outcome)
        }
    }
}
