//! Severity scoring
//!
//! Every score lives on a 0..=10 scale. The daily model weighs priority,
//! SLA status, accumulated delay and currently active delayed portions.

use crate::types::{DelayPortion, Priority, SlaStatus, Ticket};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_SEVERITY: u8 = 10;

pub fn priority_weight(priority: Priority) -> u8 {
    match priority {
        Priority::P1 => 4,
        Priority::P2 => 3,
        Priority::P3 => 2,
        Priority::P4 => 1,
        Priority::P5 => 0,
    }
}

pub fn status_weight(status: SlaStatus) -> u8 {
    match status {
        SlaStatus::Breached => 4,
        SlaStatus::AtRisk => 3,
        SlaStatus::Delayed => 2,
        SlaStatus::WithinSla => 0,
    }
}

/// +2 beyond four hours of delay, +1 beyond one hour
pub fn delay_weight(delay_minutes: i64) -> u8 {
    if delay_minutes > 240 {
        2
    } else if delay_minutes > 60 {
        1
    } else {
        0
    }
}

/// Severity used by the daily analysis
pub fn daily_severity(ticket: &Ticket, delays: &[DelayPortion]) -> u8 {
    let active = delays.iter().filter(|d| d.status.is_active()).count().min(2) as u8;

    let score = priority_weight(ticket.priority)
        + status_weight(ticket.sla_status)
        + delay_weight(ticket.delay_minutes)
        + active;

    score.min(MAX_SEVERITY)
}

/// Escalation level: 3 director, 2 manager, 1 team lead, 0 none
pub fn escalation_level(severity: u8) -> u8 {
    match severity {
        s if s >= 9 => 3,
        s if s >= 7 => 2,
        s if s >= 5 => 1,
        _ => 0,
    }
}

/// Coarse risk band derived from a severity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_severity(severity: u8) -> Self {
        match severity {
            s if s >= 8 => RiskLevel::Critical,
            s if s >= 6 => RiskLevel::High,
            s if s >= 4 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
