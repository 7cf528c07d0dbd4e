//! Batch risk assessment command

use slamon_core::{error::Result, SlaConfig};

use super::helpers::open_agent;

pub async fn handle(config: SlaConfig, limit: usize) -> Result<()> {
    println!("Fetching tickets for analysis...");
    let agent = open_agent(config).await?;
    agent.assess(limit).await?;
    Ok(())
}
