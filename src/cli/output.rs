use anyhow::{bail, Result};
use hrm_core_types::WorkflowOutcome;
use serde::Serialize;
use serde_json::{json, Value};

/// JSON printed by workflow commands. Operators see the full failure message.
pub fn outcome_json<T: Serialize>(outcome: &WorkflowOutcome<T>) -> Result<Value> {
    Ok(match outcome {
        WorkflowOutcome::Success(data) => json!({
            "success": true,
            "data": serde_json::to_value(data)?,
        }),
        WorkflowOutcome::Failure(failure) => json!({
            "success": false,
            "errorClass": failure.class().as_str(),
            "errorMessage": failure.message,
        }),
    })
}

/// Prints the outcome and turns a failure into a non-zero exit.
pub fn print_outcome<T: Serialize>(outcome: &WorkflowOutcome<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome_json(outcome)?)?);
    if let Some(failure) = outcome.failure() {
        bail!("workflow failed ({}): {}", failure.class(), failure.message);
    }
    Ok(())
}
