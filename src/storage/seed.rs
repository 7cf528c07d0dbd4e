//! Sample data for demos and local testing
//!
//! Populates a store with the reference services and customers plus a
//! batch of randomly generated tickets. A fixed seed reproduces the same
//! data set.

use crate::config::SlaThresholds;
use crate::error::Result;
use crate::storage::{LibsqlStore, TicketStore};
use crate::types::{
    CustomerTier, DelayPortion, DelayStatus, DelayType, EscalationRecord, EscalationStatus,
    Priority, SlaStatus, Ticket, TicketId, TicketStatus,
};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

/// (name, category, default SLA hours)
pub const SAMPLE_SERVICES: [(&str, &str, i64); 5] = [
    ("Database Support", "Infrastructure", 4),
    ("API Monitoring", "Application", 8),
    ("Frontend UI", "Application", 24),
    ("Security Incident", "Security", 2),
    ("Payment Gateway", "Finance", 1),
];

/// (name, tier, account manager)
pub const SAMPLE_CUSTOMERS: [(&str, CustomerTier, &str); 4] = [
    ("TechCorp Inc", CustomerTier::Enterprise, "John Smith"),
    ("StartUp Ventures", CustomerTier::Premium, "Sarah Johnson"),
    ("Global Bank", CustomerTier::Platinum, "Mike Chen"),
    ("EduTech Solutions", CustomerTier::Premium, "Emma Wilson"),
];

const TEAMS: [&str; 4] = ["Team A", "Team B", "Team C", "Team D"];
const SEEDED_PRIORITIES: [Priority; 4] = [Priority::P1, Priority::P2, Priority::P3, Priority::P4];
const SLA_WEIGHTS: [u32; 4] = [40, 25, 20, 15];
const ISSUE_KINDS: [&str; 3] = ["Performance", "Error", "Access"];
const ESCALATION_REASONS: [&str; 3] = ["SLA breach", "Customer complaint", "Technical blocker"];

/// Counts of what a seeding run inserted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedSummary {
    pub services: usize,
    pub customers: usize,
    pub tickets: usize,
    pub delays: usize,
    pub escalations: usize,
}

/// Insert reference data and `count` generated tickets
///
/// Ticket creation times fall within the week before `now`. With
/// `seed = Some(..)` the generated set is deterministic.
pub async fn seed(
    store: &LibsqlStore,
    count: usize,
    seed: Option<u64>,
    now: DateTime<Utc>,
) -> Result<SeedSummary> {
    seed_with_thresholds(store, count, seed, &SlaThresholds::default(), now).await
}

/// Like [`seed`], deriving each deadline from the priority's resolution target
pub async fn seed_with_thresholds(
    store: &LibsqlStore,
    count: usize,
    seed: Option<u64>,
    thresholds: &SlaThresholds,
    now: DateTime<Utc>,
) -> Result<SeedSummary> {
    let mut rng = match seed {
        Some(value) => StdRng::seed_from_u64(value),
        None => StdRng::from_entropy(),
    };
    let mut summary = SeedSummary::default();

    for (name, category, hours) in SAMPLE_SERVICES {
        store.upsert_service(name, category, hours).await?;
        summary.services += 1;
    }
    for (name, tier, manager) in SAMPLE_CUSTOMERS {
        store.upsert_customer(name, tier, manager).await?;
        summary.customers += 1;
    }

    let sla_dist = WeightedIndex::new(SLA_WEIGHTS)
        .map_err(|e| crate::error::SlaError::Other(format!("Invalid SLA weights: {}", e)))?;

    for i in 0..count {
        let created_at = now - Duration::hours(rng.gen_range(1..=168));
        let priority = SEEDED_PRIORITIES[rng.gen_range(0..SEEDED_PRIORITIES.len())];
        let sla_hours = thresholds.for_priority(priority).resolution_hours as i64;
        let deadline = created_at + Duration::hours(sla_hours);
        let sla_status = SlaStatus::ALL[sla_dist.sample(&mut rng)];

        let (service, _, _) = SAMPLE_SERVICES[rng.gen_range(0..SAMPLE_SERVICES.len())];
        let (customer, tier, _) = SAMPLE_CUSTOMERS[rng.gen_range(0..SAMPLE_CUSTOMERS.len())];
        let kind = ISSUE_KINDS[rng.gen_range(0..ISSUE_KINDS.len())];

        let ticket = Ticket {
            id: TicketId(format!("TKT-{}-{}", created_at.format("%Y%m%d"), 1000 + i)),
            title: format!("Test Issue {} - {}", i + 1, kind),
            service: service.to_string(),
            customer: Some(customer.to_string()),
            customer_tier: Some(tier),
            priority,
            status: TicketStatus::ALL[rng.gen_range(0..TicketStatus::ALL.len())],
            created_at,
            resolution_deadline: deadline,
            resolved_at: None,
            assigned_team: TEAMS[rng.gen_range(0..TEAMS.len())].to_string(),
            sla_status,
            delay_minutes: if sla_status.is_delayed() {
                rng.gen_range(0..=480)
            } else {
                0
            },
        };
        store.create_ticket(&ticket).await?;
        summary.tickets += 1;

        if sla_status.is_delayed() && rng.gen::<f64>() > 0.4 {
            summary.delays += add_sample_delays(store, &mut rng, &ticket, sla_hours).await?;
        }

        if matches!(sla_status, SlaStatus::Breached | SlaStatus::AtRisk) && rng.gen::<f64>() > 0.6
        {
            let record = EscalationRecord {
                id: None,
                ticket_id: ticket.id.clone(),
                level: rng.gen_range(1..=3),
                reason: ESCALATION_REASONS[rng.gen_range(0..ESCALATION_REASONS.len())]
                    .to_string(),
                escalated_at: created_at + Duration::hours(rng.gen_range(1..=12)),
                status: EscalationStatus::ALL[rng.gen_range(0..EscalationStatus::ALL.len())],
                resolved_at: None,
            };
            store.record_escalation(&record).await?;
            summary.escalations += 1;
        }
    }

    info!(
        "Seeded {} tickets ({} delays, {} escalations)",
        summary.tickets, summary.delays, summary.escalations
    );
    Ok(summary)
}

async fn add_sample_delays(
    store: &LibsqlStore,
    rng: &mut StdRng,
    ticket: &Ticket,
    sla_hours: i64,
) -> Result<usize> {
    let count = rng.gen_range(1..=3);
    for _ in 0..count {
        let started_at = ticket.created_at + Duration::hours(rng.gen_range(1..sla_hours.max(2)));
        let duration = rng.gen_range(30..=240);
        let delay = DelayPortion {
            id: None,
            ticket_id: ticket.id.clone(),
            delay_type: DelayType::ALL[rng.gen_range(0..DelayType::ALL.len())],
            started_at,
            ended_at: Some(started_at + Duration::minutes(duration)),
            duration_minutes: duration,
            status: DelayStatus::ALL[rng.gen_range(0..DelayStatus::ALL.len())],
            impact_score: rng.gen_range(1..=10),
            resolution_notes: String::new(),
        };
        store.add_delay(&delay).await?;
    }
    debug!("Added {} delays for {}", count, ticket.id);
    Ok(count)
}
