//! Batch risk assessment
//!
//! A broader scoring model than the daily one: on top of priority, SLA
//! status and delay it considers the customer tier, whether the service is
//! business critical, and how loaded the assigned team is relative to its
//! peers in the same batch.

use super::severity::{
    delay_weight, escalation_level, priority_weight, status_weight, RiskLevel, MAX_SEVERITY,
};
use super::action_bands;
use crate::types::{CustomerTier, SlaStatus, Ticket, TicketId};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const CRITICAL_SERVICES: [&str; 3] = ["Database", "Security", "Payment"];
const PEAK_HOURS: [u32; 4] = [9, 10, 14, 15];

/// Status a ticket is heading towards given its assessed severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectedStatus {
    CriticalBreach,
    HighRisk,
    MediumRisk,
    Breached,
    AtRisk,
    Delayed,
    WithinSla,
}

impl ProjectedStatus {
    fn project(severity: u8, current: SlaStatus) -> Self {
        match severity {
            s if s >= 8 => ProjectedStatus::CriticalBreach,
            s if s >= 6 => ProjectedStatus::HighRisk,
            s if s >= 4 => ProjectedStatus::MediumRisk,
            _ => match current {
                SlaStatus::Breached => ProjectedStatus::Breached,
                SlaStatus::AtRisk => ProjectedStatus::AtRisk,
                SlaStatus::Delayed => ProjectedStatus::Delayed,
                SlaStatus::WithinSla => ProjectedStatus::WithinSla,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketAssessment {
    pub ticket_id: TicketId,
    pub title: String,
    pub severity: u8,
    pub projected_status: ProjectedStatus,
    pub risk_level: RiskLevel,
    pub insights: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub needs_escalation: bool,
    pub escalation_level: u8,
}

/// Totals over an assessed batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    pub total_analyzed: usize,
    pub critical: usize,
    pub high_risk: usize,
    pub escalations_needed: usize,
    pub avg_severity: f64,
    /// Highest severity first
    pub top_issues: Vec<TicketAssessment>,
    pub assessments: Vec<TicketAssessment>,
}

fn tier_weight(tier: Option<CustomerTier>) -> u8 {
    match tier {
        Some(CustomerTier::Platinum) => 2,
        Some(CustomerTier::Enterprise) | Some(CustomerTier::Premium) => 1,
        Some(CustomerTier::Basic) | None => 0,
    }
}

fn is_critical_service(service: &str) -> bool {
    CRITICAL_SERVICES.iter().any(|name| service.contains(name))
}

fn load_weight(team_load: f64) -> u8 {
    if team_load > 150.0 {
        2
    } else if team_load > 100.0 {
        1
    } else {
        0
    }
}

/// Team load as a percentage of the mean tickets per team in the batch
pub fn team_loads(tickets: &[Ticket]) -> HashMap<String, f64> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for ticket in tickets {
        *counts.entry(ticket.assigned_team.clone()).or_default() += 1;
    }
    if counts.is_empty() {
        return HashMap::new();
    }

    let mean = tickets.len() as f64 / counts.len() as f64;
    counts
        .into_iter()
        .map(|(team, count)| (team, (count as f64 / mean * 100.0).round()))
        .collect()
}

pub fn assessment_severity(ticket: &Ticket, team_load: f64) -> u8 {
    let mut score = priority_weight(ticket.priority)
        + status_weight(ticket.sla_status)
        + delay_weight(ticket.delay_minutes)
        + tier_weight(ticket.customer_tier)
        + load_weight(team_load);
    if is_critical_service(&ticket.service) {
        score += 1;
    }
    score.min(MAX_SEVERITY)
}

/// Assess a single ticket given its team's load and the local time of day
pub fn assess(
    ticket: &Ticket,
    team_load: f64,
    escalation_threshold: u8,
    now: DateTime<Utc>,
) -> TicketAssessment {
    let severity = assessment_severity(ticket, team_load);
    let tier = ticket.customer_tier.unwrap_or(CustomerTier::Basic);

    let mut insights = Vec::new();
    if severity >= 8 {
        insights.push(format!(
            "🚨 CRITICAL: Ticket {} requires immediate attention",
            ticket.id
        ));
        insights.push(format!(
            "🔴 HIGH IMPACT: {} service for {} customer at risk",
            ticket.service, tier
        ));
    } else if severity >= 6 {
        insights.push(format!(
            "⚠️  HIGH RISK: {} service approaching SLA breach",
            ticket.service
        ));
        if ticket.delay_minutes > 120 {
            insights.push(format!(
                "⏰ EXTENDED DELAY: {}h {}m overdue",
                ticket.delay_minutes / 60,
                ticket.delay_minutes % 60
            ));
        }
    } else if severity >= 4 {
        insights.push(format!(
            "🔶 MEDIUM RISK: Monitor {} ticket closely",
            ticket.service
        ));
        if ticket.priority.is_high() {
            insights.push(format!(
                "🎯 HIGH PRIORITY: {} ticket needs regular updates",
                ticket.priority
            ));
        }
    }

    if team_load > 120.0 {
        insights.push(format!(
            "👥 TEAM CAPACITY: {} at {:.0}% capacity",
            ticket.assigned_team, team_load
        ));
    }
    if PEAK_HOURS.contains(&now.hour()) {
        insights.push("⏰ PEAK HOUR: Resolution may be delayed due to high volume".to_string());
    }
    if insights.is_empty() {
        insights.push("✅ NORMAL: Ticket within expected parameters".to_string());
    }

    TicketAssessment {
        ticket_id: ticket.id.clone(),
        title: ticket.title.clone(),
        severity,
        projected_status: ProjectedStatus::project(severity, ticket.sla_status),
        risk_level: RiskLevel::from_severity(severity),
        insights,
        recommended_actions: action_bands(severity),
        needs_escalation: severity >= escalation_threshold,
        escalation_level: escalation_level(severity),
    }
}

/// Assess every ticket and summarise the batch
pub fn assess_batch(
    tickets: &[Ticket],
    escalation_threshold: u8,
    now: DateTime<Utc>,
) -> BatchAnalysis {
    if tickets.is_empty() {
        return BatchAnalysis::default();
    }

    let loads = team_loads(tickets);
    let assessments: Vec<TicketAssessment> = tickets
        .iter()
        .map(|t| {
            let load = loads.get(&t.assigned_team).copied().unwrap_or(0.0);
            assess(t, load, escalation_threshold, now)
        })
        .collect();

    let total_severity: u32 = assessments.iter().map(|a| a.severity as u32).sum();
    let mut top_issues = assessments.clone();
    top_issues.sort_by(|a, b| b.severity.cmp(&a.severity));

    BatchAnalysis {
        total_analyzed: assessments.len(),
        critical: assessments
            .iter()
            .filter(|a| a.risk_level == RiskLevel::Critical)
            .count(),
        high_risk: assessments
            .iter()
            .filter(|a| a.risk_level == RiskLevel::High)
            .count(),
        escalations_needed: assessments.iter().filter(|a| a.needs_escalation).count(),
        avg_severity: total_severity as f64 / assessments.len() as f64,
        top_issues,
        assessments,
    }
}
