//! Ticket listing command

use chrono::Utc;
use slamon_core::{
    error::Result, metrics::format_duration, storage::ConnectionMode, LibsqlStore, Priority,
    SlaConfig, SlaStatus, TicketFilter, TicketStore,
};

pub async fn handle(
    config: SlaConfig,
    status: Option<String>,
    priority: Option<String>,
    team: Option<String>,
    limit: usize,
) -> Result<()> {
    let mut filter = TicketFilter::default();
    if let Some(status) = status {
        filter = filter.with_sla_status(status.parse::<SlaStatus>()?);
    }
    if let Some(priority) = priority {
        filter = filter.with_priority(priority.parse::<Priority>()?);
    }
    if let Some(team) = team {
        filter = filter.with_team(team);
    }

    let path = config.database.path.to_string_lossy().to_string();
    let store = LibsqlStore::new(ConnectionMode::Local(path)).await?;
    let tickets = store.tickets(&filter, limit).await?;

    if tickets.is_empty() {
        println!("No tickets found");
        return Ok(());
    }

    let now = Utc::now();
    println!(
        "{:<18} {:<3} {:<11} {:<8} {:<18} {:>10}  {}",
        "ID", "PRI", "SLA", "TEAM", "SERVICE", "DEADLINE", "TITLE"
    );
    for t in &tickets {
        let deadline = if t.resolution_deadline > now {
            format!("in {}", format_duration(t.resolution_deadline - now))
        } else {
            format!("-{}", format_duration(now - t.resolution_deadline))
        };
        println!(
            "{:<18} {:<3} {:<11} {:<8} {:<18} {:>10}  {}",
            t.id, t.priority, t.sla_status, t.assigned_team, t.service, deadline, t.title
        );
    }
    println!("\n{} tickets", tickets.len());
    Ok(())
}
