//! Escalation check for breached tickets

use slamon_core::{error::Result, SlaConfig};

use super::helpers::open_agent;

pub async fn handle(config: SlaConfig, limit: usize) -> Result<()> {
    println!("Checking for escalations...");
    let agent = open_agent(config).await?;
    agent.escalate_breached(limit).await?;
    Ok(())
}
