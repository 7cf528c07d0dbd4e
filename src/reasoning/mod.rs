//! SLA reasoning engine
//!
//! Turns tickets and their delayed portions into scored decisions:
//! - [`context`] aggregates a ticket window into an [`AnalysisContext`]
//! - [`severity`] holds the scoring tables
//! - [`assessment`] implements the broader batch risk model
//!
//! The engine itself is stateless apart from its configured thresholds.

pub mod assessment;
pub mod context;
pub mod severity;

pub use assessment::{assess, assess_batch, BatchAnalysis, ProjectedStatus, TicketAssessment};
pub use context::{build_context, AnalysisContext, GroupStats, TimeAnalysis};
pub use severity::{daily_severity, escalation_level, RiskLevel};

use crate::config::ReasoningConfig;
use crate::types::{DelayPortion, DelayStatus, SlaStatus, Ticket, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of reasoning about one ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDecision {
    pub ticket_id: TicketId,
    pub severity: u8,
    pub insights: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub needs_escalation: bool,
    pub escalation_level: u8,
}

/// Actions recommended for a severity band
pub(crate) fn action_bands(severity: u8) -> Vec<String> {
    let actions: &[&str] = match severity {
        s if s >= 8 => &[
            "🚨 IMMEDIATE: Escalate to team lead and manager",
            "📞 Contact customer with status update",
        ],
        s if s >= 6 => &[
            "⚠️  URGENT: Review with assigned agent",
            "📋 Check for blockers and dependencies",
        ],
        s if s >= 4 => &["🔍 Review ticket progress", "⏰ Set reminder for follow-up"],
        _ => &[],
    };
    actions.iter().map(|a| a.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct ReasoningEngine {
    escalation_threshold: u8,
}

impl Default for ReasoningEngine {
    fn default() -> Self {
        Self::new(&ReasoningConfig::default())
    }
}

impl ReasoningEngine {
    pub fn new(config: &ReasoningConfig) -> Self {
        Self {
            escalation_threshold: config.escalation_threshold,
        }
    }

    pub fn escalation_threshold(&self) -> u8 {
        self.escalation_threshold
    }

    pub fn build_context(&self, tickets: &[Ticket]) -> AnalysisContext {
        build_context(tickets)
    }

    /// Score a ticket against its delayed portions
    pub fn reason_about_ticket(
        &self,
        ticket: &Ticket,
        delays: &[DelayPortion],
        now: DateTime<Utc>,
    ) -> TicketDecision {
        let severity = daily_severity(ticket, delays);

        let mut insights = Vec::new();
        match ticket.sla_status {
            SlaStatus::Breached => {
                insights.push(format!("🚨 CRITICAL: SLA breached for {}", ticket.service));
                if !delays.is_empty() {
                    let total: i64 = delays.iter().map(|d| d.duration_minutes).sum();
                    insights.push(format!(
                        "⏱️  Total delay: {} minutes across {} delays",
                        total,
                        delays.len()
                    ));
                }
            }
            SlaStatus::AtRisk => {
                insights.push(format!(
                    "⚠️  AT RISK: {:.1} hours to deadline",
                    ticket.hours_to_deadline(now)
                ));
            }
            SlaStatus::Delayed => {
                insights.push(format!(
                    "🔶 DELAYED: {} minutes overdue",
                    ticket.delay_minutes
                ));
            }
            SlaStatus::WithinSla => {}
        }

        let active = delays.iter().filter(|d| d.status.is_active()).count();
        if active > 0 {
            insights.push(format!("⏸️  {} active delays ongoing", active));
        }

        let mut recommended_actions = action_bands(severity);
        let pending = delays
            .iter()
            .filter(|d| d.status == DelayStatus::Pending)
            .count();
        if pending > 0 {
            recommended_actions.push(format!("⏸️  Address {} pending delays", pending));
        }

        let decision = TicketDecision {
            ticket_id: ticket.id.clone(),
            severity,
            insights,
            recommended_actions,
            needs_escalation: severity >= self.escalation_threshold,
            escalation_level: escalation_level(severity),
        };
        debug!(
            "Ticket {} severity {} (escalate: {})",
            decision.ticket_id, decision.severity, decision.needs_escalation
        );
        decision
    }

    /// Batch risk assessment with this engine's threshold
    pub fn assess_batch(&self, tickets: &[Ticket], now: DateTime<Utc>) -> BatchAnalysis {
        assess_batch(tickets, self.escalation_threshold, now)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{DelayType, Priority, TicketStatus};
    use chrono::{Duration, TimeZone};

    pub(crate) fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    pub(crate) fn ticket(id: &str, priority: Priority, sla: SlaStatus, delay: i64) -> Ticket {
        let created = fixed_now() - Duration::hours(6);
        Ticket {
            id: TicketId::new(id),
            title: format!("Issue {}", id),
            service: "Database Support".to_string(),
            customer: None,
            customer_tier: None,
            priority,
            status: TicketStatus::InProgress,
            created_at: created,
            resolution_deadline: created + Duration::hours(8),
            resolved_at: None,
            assigned_team: "Team A".to_string(),
            sla_status: sla,
            delay_minutes: delay,
        }
    }

    pub(crate) fn delay(ticket_id: &str, status: DelayStatus, minutes: i64) -> DelayPortion {
        DelayPortion {
            id: None,
            ticket_id: TicketId::new(ticket_id),
            delay_type: DelayType::Internal,
            started_at: fixed_now() - Duration::hours(2),
            ended_at: None,
            duration_minutes: minutes,
            status,
            impact_score: 5,
            resolution_notes: String::new(),
        }
    }

    #[test]
    fn test_breached_ticket_reports_total_delay() {
        let engine = ReasoningEngine::default();
        let t = ticket("TKT-1", Priority::P1, SlaStatus::Breached, 300);
        let delays = vec![
            delay("TKT-1", DelayStatus::Pending, 30),
            delay("TKT-1", DelayStatus::Resolved, 45),
        ];

        let d = engine.reason_about_ticket(&t, &delays, fixed_now());
        assert_eq!(d.severity, 10);
        assert!(d.needs_escalation);
        assert_eq!(d.escalation_level, 3);
        assert_eq!(d.insights[0], "🚨 CRITICAL: SLA breached for Database Support");
        assert_eq!(d.insights[1], "⏱️  Total delay: 75 minutes across 2 delays");
        assert_eq!(d.insights[2], "⏸️  1 active delays ongoing");
        assert_eq!(d.recommended_actions.len(), 3);
        assert_eq!(d.recommended_actions[2], "⏸️  Address 1 pending delays");
    }

    #[test]
    fn test_at_risk_reports_hours_to_deadline() {
        let engine = ReasoningEngine::default();
        let t = ticket("TKT-2", Priority::P3, SlaStatus::AtRisk, 0);

        let d = engine.reason_about_ticket(&t, &[], fixed_now());
        // deadline is created + 8h, created is now - 6h
        assert_eq!(d.insights, vec!["⚠️  AT RISK: 2.0 hours to deadline"]);
        assert_eq!(d.severity, 5);
        assert!(!d.needs_escalation);
        assert_eq!(d.escalation_level, 1);
    }

    #[test]
    fn test_threshold_controls_escalation() {
        let config = ReasoningConfig {
            escalation_threshold: 5,
            ..Default::default()
        };
        let engine = ReasoningEngine::new(&config);
        let t = ticket("TKT-3", Priority::P3, SlaStatus::AtRisk, 0);
        assert!(engine.reason_about_ticket(&t, &[], fixed_now()).needs_escalation);
    }

    #[test]
    fn test_within_sla_has_no_insights_or_actions() {
        let engine = ReasoningEngine::default();
        let t = ticket("TKT-4", Priority::P4, SlaStatus::WithinSla, 0);
        let d = engine.reason_about_ticket(&t, &[], fixed_now());
        assert!(d.insights.is_empty());
        assert!(d.recommended_actions.is_empty());
        assert_eq!(d.escalation_level, 0);
    }
}
