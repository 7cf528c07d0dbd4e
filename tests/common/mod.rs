//! Common test utilities and helpers

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use slamon_core::types::CustomerTier;
use slamon_core::{
    ConnectionMode, LibsqlStore, Priority, SlaConfig, SlaStatus, Ticket, TicketId, TicketStatus,
};
use tempfile::TempDir;

/// Fixed reference time so windows and deadlines are stable
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

/// File-backed store inside a fresh temp directory
///
/// The directory must outlive the store, so both are returned.
pub async fn create_test_store() -> (TempDir, LibsqlStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("sla_test.db");
    let store = LibsqlStore::new_with_validation(
        ConnectionMode::Local(path.display().to_string()),
        true,
    )
    .await
    .expect("Failed to create test store");
    (dir, store)
}

/// Configuration pointing at `dir` for both the database and reports
pub fn test_config(dir: &TempDir) -> SlaConfig {
    let mut config = SlaConfig::default();
    config.database.path = dir.path().join("sla_test.db");
    config.app.reports_dir = dir.path().join("reports");
    config
}

/// Ticket builder with sensible defaults
pub struct TicketBuilder {
    ticket: Ticket,
}

impl TicketBuilder {
    pub fn new(id: &str) -> Self {
        let created_at = test_now() - Duration::hours(6);
        Self {
            ticket: Ticket {
                id: TicketId::new(id),
                title: format!("Issue {}", id),
                service: "Email Service".to_string(),
                customer: None,
                customer_tier: None,
                priority: Priority::P3,
                status: TicketStatus::New,
                created_at,
                resolution_deadline: created_at + Duration::hours(24),
                resolved_at: None,
                assigned_team: "Team A".to_string(),
                sla_status: SlaStatus::WithinSla,
                delay_minutes: 0,
            },
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.ticket.priority = priority;
        self
    }

    pub fn sla(mut self, status: SlaStatus, delay_minutes: i64) -> Self {
        self.ticket.sla_status = status;
        self.ticket.delay_minutes = delay_minutes;
        self
    }

    pub fn service(mut self, service: &str) -> Self {
        self.ticket.service = service.to_string();
        self
    }

    pub fn team(mut self, team: &str) -> Self {
        self.ticket.assigned_team = team.to_string();
        self
    }

    pub fn customer(mut self, name: &str, tier: CustomerTier) -> Self {
        self.ticket.customer = Some(name.to_string());
        self.ticket.customer_tier = Some(tier);
        self
    }

    pub fn created_hours_ago(mut self, hours: i64) -> Self {
        let span = self.ticket.resolution_deadline - self.ticket.created_at;
        self.ticket.created_at = test_now() - Duration::hours(hours);
        self.ticket.resolution_deadline = self.ticket.created_at + span;
        self
    }

    pub fn build(self) -> Ticket {
        self.ticket
    }
}
