//! Daily analysis command

use slamon_core::{error::Result, MonitoringAgent, SlaConfig};

use super::helpers::{open_agent, print_banner};

pub async fn handle(config: SlaConfig) -> Result<()> {
    print_banner("🤖 SLA MONITORING AGENT - DAILY ANALYSIS");

    let agent = open_agent(config).await?;
    let outcome = agent.run_daily_analysis().await?;

    println!();
    if outcome.context.is_some() {
        print_banner("✅ AGENT ANALYSIS COMPLETE");
    }
    Ok(())
}
