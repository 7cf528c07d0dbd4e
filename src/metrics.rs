//! SLA metric helpers shared by the store, reports and CLI

use crate::types::{SlaStatus, Ticket};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Aggregate SLA performance over a set of tickets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlaMetrics {
    pub total_tickets: usize,
    pub within_sla: usize,
    pub delayed: usize,
    pub at_risk: usize,
    pub breached: usize,
    pub avg_delay_minutes: f64,
    pub compliance_rate: f64,
}

impl SlaMetrics {
    /// Compute metrics in memory
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        if tickets.is_empty() {
            return Self::default();
        }

        let count = |status: SlaStatus| tickets.iter().filter(|t| t.sla_status == status).count();
        let total = tickets.len();
        let within_sla = count(SlaStatus::WithinSla);
        let total_delay: i64 = tickets.iter().map(|t| t.delay_minutes).sum();

        Self {
            total_tickets: total,
            within_sla,
            delayed: count(SlaStatus::Delayed),
            at_risk: count(SlaStatus::AtRisk),
            breached: count(SlaStatus::Breached),
            avg_delay_minutes: round2(total_delay as f64 / total as f64),
            compliance_rate: compliance_rate(within_sla, total),
        }
    }
}

/// Percentage of tickets within SLA, rounded to two decimals
pub fn compliance_rate(within_sla: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(within_sla as f64 * 100.0 / total as f64)
}

/// Percentage helper that yields 0 for an empty denominator
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Human-readable duration: `2h 5m`, `4m 10s` or `30s`
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_rate_rounding() {
        assert_eq!(compliance_rate(0, 0), 0.0);
        assert_eq!(compliance_rate(2, 3), 66.67);
        assert_eq!(compliance_rate(5, 5), 100.0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(125)), "2h 5m");
        assert_eq!(format_duration(Duration::seconds(250)), "4m 10s");
        assert_eq!(format_duration(Duration::seconds(30)), "30s");
        assert_eq!(format_duration(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = SlaMetrics::from_tickets(&[]);
        assert_eq!(metrics.total_tickets, 0);
        assert_eq!(metrics.compliance_rate, 0.0);
    }
}
