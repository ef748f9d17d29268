use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    hrm_autopilot::cli::run().await
}
