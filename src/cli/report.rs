//! Metrics report command

use slamon_core::{error::Result, SlaConfig};

use super::helpers::open_agent;

pub async fn handle(config: SlaConfig, days: u32) -> Result<()> {
    println!("Generating SLA report over the last {} days...", days);
    let agent = open_agent(config).await?;
    agent.metrics_report(days).await?;
    Ok(())
}
