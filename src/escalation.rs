//! Escalation manager
//!
//! Maps scored tickets onto the escalation matrix and produces plans
//! naming who must act, how urgently and by when. Notification channels
//! are recorded on each plan; delivery is left to downstream tooling.

use crate::config::{EscalationConfig, EscalationLevel, NotificationConfig};
use crate::error::{Result, SlaError};
use crate::reasoning::{TicketAssessment, TicketDecision};
use crate::storage::TicketStore;
use crate::types::{EscalationRecord, EscalationStatus, TicketId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Anything scored that may need escalating
pub trait EscalationCandidate {
    fn ticket_id(&self) -> &TicketId;
    fn severity(&self) -> u8;
    fn needs_escalation(&self) -> bool;
    fn escalation_level(&self) -> u8;
    fn insights(&self) -> &[String];
    fn actions(&self) -> &[String];
}

impl EscalationCandidate for TicketDecision {
    fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }
    fn severity(&self) -> u8 {
        self.severity
    }
    fn needs_escalation(&self) -> bool {
        self.needs_escalation
    }
    fn escalation_level(&self) -> u8 {
        self.escalation_level
    }
    fn insights(&self) -> &[String] {
        &self.insights
    }
    fn actions(&self) -> &[String] {
        &self.recommended_actions
    }
}

impl EscalationCandidate for TicketAssessment {
    fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }
    fn severity(&self) -> u8 {
        self.severity
    }
    fn needs_escalation(&self) -> bool {
        self.needs_escalation
    }
    fn escalation_level(&self) -> u8 {
        self.escalation_level
    }
    fn insights(&self) -> &[String] {
        &self.insights
    }
    fn actions(&self) -> &[String] {
        &self.recommended_actions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Slack,
    Dashboard,
}

fn channels(config: &NotificationConfig) -> Vec<NotificationChannel> {
    let mut out = Vec::new();
    if config.email {
        out.push(NotificationChannel::Email);
    }
    if config.slack {
        out.push(NotificationChannel::Slack);
    }
    if config.dashboard {
        out.push(NotificationChannel::Dashboard);
    }
    out
}

/// "1 hour", "30 minutes", "2 hours"
pub fn timeframe_label(minutes: u32) -> String {
    match minutes {
        60 => "1 hour".to_string(),
        m if m > 60 && m % 60 == 0 => format!("{} hours", m / 60),
        1 => "1 minute".to_string(),
        m => format!("{} minutes", m),
    }
}

/// Who must act on an escalated ticket and by when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationPlan {
    pub ticket_id: TicketId,
    /// Matrix level applied (a level-0 decision is raised to 1)
    pub level: u8,
    pub severity: u8,
    pub target: String,
    pub urgency: String,
    pub timeframe: String,
    pub deadline: DateTime<Utc>,
    pub reason: String,
    pub insights: Vec<String>,
    pub actions: Vec<String>,
    pub notify: Vec<NotificationChannel>,
    pub created_at: DateTime<Utc>,
}

pub struct EscalationManager {
    levels: Vec<EscalationLevel>,
    notify: Vec<NotificationChannel>,
    persist: bool,
}

impl EscalationManager {
    pub fn new(config: &EscalationConfig) -> Result<Self> {
        if config.levels.is_empty() {
            return Err(SlaError::Config(
                "escalation matrix must define at least one level".to_string(),
            ));
        }
        let mut levels = config.levels.clone();
        levels.sort_by_key(|l| l.level);

        Ok(Self {
            levels,
            notify: channels(&config.notifications),
            persist: config.persist,
        })
    }

    pub fn persists(&self) -> bool {
        self.persist
    }

    /// Matrix row for a level, falling back to the lowest defined level
    pub fn matrix_row(&self, level: u8) -> &EscalationLevel {
        self.levels
            .iter()
            .find(|row| row.level == level)
            .unwrap_or(&self.levels[0])
    }

    /// Build plans for every candidate that needs escalation
    pub fn process<C: EscalationCandidate>(
        &self,
        candidates: &[C],
        now: DateTime<Utc>,
    ) -> Vec<EscalationPlan> {
        let plans: Vec<EscalationPlan> = candidates
            .iter()
            .filter(|c| c.needs_escalation())
            .map(|c| self.plan_for(c, now))
            .collect();

        if plans.is_empty() {
            debug!("No escalations needed");
        } else {
            info!("Processing {} escalations", plans.len());
        }
        plans
    }

    fn plan_for<C: EscalationCandidate>(&self, candidate: &C, now: DateTime<Utc>) -> EscalationPlan {
        let row = self.matrix_row(candidate.escalation_level());
        EscalationPlan {
            ticket_id: candidate.ticket_id().clone(),
            level: row.level,
            severity: candidate.severity(),
            target: row.target.clone(),
            urgency: row.urgency.clone(),
            timeframe: timeframe_label(row.timeframe_minutes),
            deadline: now + Duration::minutes(row.timeframe_minutes as i64),
            reason: format!("Severity score: {}/10", candidate.severity()),
            insights: candidate.insights().to_vec(),
            actions: candidate.actions().to_vec(),
            notify: self.notify.clone(),
            created_at: now,
        }
    }

    /// Record plans as active escalations; returns the number written
    pub async fn persist(&self, store: &dyn TicketStore, plans: &[EscalationPlan]) -> Result<usize> {
        for plan in plans {
            let record = EscalationRecord {
                id: None,
                ticket_id: plan.ticket_id.clone(),
                level: plan.level,
                reason: plan.reason.clone(),
                escalated_at: plan.created_at,
                status: EscalationStatus::Active,
                resolved_at: None,
            };
            store.record_escalation(&record).await?;
        }
        info!("Persisted {} escalations", plans.len());
        Ok(plans.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn decision(id: &str, severity: u8, level: u8, needs: bool) -> TicketDecision {
        TicketDecision {
            ticket_id: TicketId::new(id),
            severity,
            insights: vec![format!("insight for {}", id)],
            recommended_actions: vec!["act".to_string()],
            needs_escalation: needs,
            escalation_level: level,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_director_plan_for_level_three() {
        let manager = EscalationManager::new(&EscalationConfig::default()).unwrap();
        let plans = manager.process(&[decision("TEST-001", 9, 3, true)], now());

        assert_eq!(plans.len(), 1);
        let plan = &plans[0];
        assert_eq!(plan.target, "director");
        assert_eq!(plan.urgency, "critical");
        assert_eq!(plan.timeframe, "15 minutes");
        assert_eq!(plan.deadline, now() + Duration::minutes(15));
        assert_eq!(plan.reason, "Severity score: 9/10");
        assert_eq!(
            plan.notify,
            vec![
                NotificationChannel::Email,
                NotificationChannel::Slack,
                NotificationChannel::Dashboard
            ]
        );
    }

    #[test]
    fn test_level_zero_uses_team_lead_row() {
        let manager = EscalationManager::new(&EscalationConfig::default()).unwrap();
        let plans = manager.process(&[decision("TKT-9", 8, 0, true)], now());
        assert_eq!(plans[0].level, 1);
        assert_eq!(plans[0].target, "team_lead");
        assert_eq!(plans[0].timeframe, "1 hour");
    }

    #[test]
    fn test_no_plans_when_nothing_needs_escalation() {
        let manager = EscalationManager::new(&EscalationConfig::default()).unwrap();
        let plans = manager.process(&[decision("TKT-1", 6, 1, false)], now());
        assert!(plans.is_empty());
    }

    #[test]
    fn test_disabled_channels_are_omitted() {
        let mut config = EscalationConfig::default();
        config.notifications.email = false;
        config.notifications.slack = false;
        let manager = EscalationManager::new(&config).unwrap();
        let plans = manager.process(&[decision("TKT-2", 9, 3, true)], now());
        assert_eq!(plans[0].notify, vec![NotificationChannel::Dashboard]);
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let config = EscalationConfig {
            levels: Vec::new(),
            ..Default::default()
        };
        assert!(EscalationManager::new(&config).is_err());
    }

    #[test]
    fn test_timeframe_labels() {
        assert_eq!(timeframe_label(60), "1 hour");
        assert_eq!(timeframe_label(120), "2 hours");
        assert_eq!(timeframe_label(30), "30 minutes");
        assert_eq!(timeframe_label(90), "90 minutes");
    }
}
