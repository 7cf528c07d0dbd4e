//! Analysis context: aggregate view over the tickets in a window

use crate::metrics::percentage;
use crate::types::{Priority, SlaStatus, Ticket};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Delayed minutes beyond which a delayed ticket counts as long-running
const LONG_DELAY_MINUTES: i64 = 24 * 60;

/// Ticket counts within one grouping key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    pub total: usize,
    pub delayed: usize,
}

impl GroupStats {
    fn record(&mut self, ticket: &Ticket) {
        self.total += 1;
        if ticket.sla_status.is_delayed() {
            self.delayed += 1;
        }
    }

    pub fn delayed_percentage(&self) -> f64 {
        percentage(self.delayed, self.total)
    }

    /// Fraction in 0..=1, zero for an empty group
    pub fn delayed_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.delayed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAnalysis {
    pub breached: usize,
    pub at_risk: usize,
    pub delayed_over_24_hours: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub total_tickets: usize,
    pub delayed_count: usize,
    pub delayed_percentage: f64,
    pub avg_delay_minutes: f64,
    pub by_priority: BTreeMap<Priority, GroupStats>,
    pub by_service: BTreeMap<String, GroupStats>,
    pub by_team: BTreeMap<String, GroupStats>,
    pub time_analysis: TimeAnalysis,
}

/// Aggregate a ticket set into an [`AnalysisContext`]
pub fn build_context(tickets: &[Ticket]) -> AnalysisContext {
    let mut ctx = AnalysisContext {
        total_tickets: tickets.len(),
        ..Default::default()
    };

    let mut total_delay: i64 = 0;
    for ticket in tickets {
        if ticket.sla_status.is_delayed() {
            ctx.delayed_count += 1;
        }
        total_delay += ticket.delay_minutes;

        ctx.by_priority.entry(ticket.priority).or_default().record(ticket);
        ctx.by_service
            .entry(ticket.service.clone())
            .or_default()
            .record(ticket);
        ctx.by_team
            .entry(ticket.assigned_team.clone())
            .or_default()
            .record(ticket);

        match ticket.sla_status {
            SlaStatus::Breached => ctx.time_analysis.breached += 1,
            SlaStatus::AtRisk => ctx.time_analysis.at_risk += 1,
            SlaStatus::Delayed if ticket.delay_minutes > LONG_DELAY_MINUTES => {
                ctx.time_analysis.delayed_over_24_hours += 1
            }
            _ => {}
        }
    }

    ctx.delayed_percentage = percentage(ctx.delayed_count, ctx.total_tickets);
    if !tickets.is_empty() {
        ctx.avg_delay_minutes = total_delay as f64 / tickets.len() as f64;
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::tests::ticket;

    #[test]
    fn test_empty_context() {
        let ctx = build_context(&[]);
        assert_eq!(ctx.total_tickets, 0);
        assert_eq!(ctx.delayed_percentage, 0.0);
        assert_eq!(ctx.avg_delay_minutes, 0.0);
        assert!(ctx.by_team.is_empty());
    }

    #[test]
    fn test_grouping_and_time_analysis() {
        let mut long = ticket("TKT-3", Priority::P2, SlaStatus::Delayed, 1500);
        long.assigned_team = "Team B".to_string();
        let tickets = vec![
            ticket("TKT-1", Priority::P1, SlaStatus::Breached, 300),
            ticket("TKT-2", Priority::P1, SlaStatus::WithinSla, 0),
            long,
            ticket("TKT-4", Priority::P3, SlaStatus::AtRisk, 100),
        ];

        let ctx = build_context(&tickets);
        assert_eq!(ctx.total_tickets, 4);
        assert_eq!(ctx.delayed_count, 3);
        assert_eq!(ctx.delayed_percentage, 75.0);
        assert_eq!(ctx.avg_delay_minutes, 475.0);

        assert_eq!(ctx.by_priority[&Priority::P1], GroupStats { total: 2, delayed: 1 });
        assert_eq!(ctx.by_team["Team A"], GroupStats { total: 3, delayed: 2 });
        assert_eq!(ctx.by_team["Team B"].delayed_percentage(), 100.0);

        assert_eq!(ctx.time_analysis.breached, 1);
        assert_eq!(ctx.time_analysis.at_risk, 1);
        assert_eq!(ctx.time_analysis.delayed_over_24_hours, 1);
    }
}
