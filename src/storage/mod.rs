//! Storage layer for the SLA monitoring agent
//!
//! Provides the [`TicketStore`] abstraction over tickets, delayed portions
//! and escalations, a libSQL implementation, and sample-data seeding.

pub mod libsql;
pub mod seed;

use crate::error::Result;
use crate::metrics::SlaMetrics;
use crate::types::{
    DelayPortion, EscalationRecord, EscalationStatus, Priority, SlaStatus, Ticket, TicketId,
    TicketStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use self::libsql::{ConnectionMode, LibsqlStore};

/// Optional constraints for ticket queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketFilter {
    pub sla_status: Option<SlaStatus>,
    pub priority: Option<Priority>,
    pub assigned_team: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl TicketFilter {
    pub fn with_sla_status(mut self, status: SlaStatus) -> Self {
        self.sla_status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.assigned_team = Some(team.into());
        self
    }

    pub fn created_after(mut self, at: DateTime<Utc>) -> Self {
        self.created_after = Some(at);
        self
    }
}

/// Storage backend trait defining all required operations
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Round-trip a trivial query
    async fn health_check(&self) -> Result<()>;

    /// Tickets matching a filter, most urgent priority first then newest
    async fn tickets(&self, filter: &TicketFilter, limit: usize) -> Result<Vec<Ticket>>;

    /// Tickets created at or after `since`, ordered by priority then deadline
    async fn tickets_since(&self, since: DateTime<Utc>) -> Result<Vec<Ticket>>;

    /// Retrieve a ticket by ID
    async fn get_ticket(&self, id: &TicketId) -> Result<Ticket>;

    /// Delayed portions for the given tickets, most recent first
    async fn delays_for(&self, ticket_ids: &[TicketId]) -> Result<Vec<DelayPortion>>;

    /// Escalation records, highest level first
    async fn escalations(&self, status: Option<EscalationStatus>) -> Result<Vec<EscalationRecord>>;

    /// Aggregate SLA metrics over tickets created at or after `since`
    async fn sla_metrics(&self, since: DateTime<Utc>) -> Result<SlaMetrics>;

    /// Insert a ticket, creating its service and customer rows if needed
    async fn create_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Update workflow status and optionally SLA status
    async fn update_ticket_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
        sla_status: Option<SlaStatus>,
    ) -> Result<()>;

    /// Insert a delayed portion, returning its row ID
    async fn add_delay(&self, delay: &DelayPortion) -> Result<i64>;

    /// Insert an escalation record, returning its row ID
    async fn record_escalation(&self, record: &EscalationRecord) -> Result<i64>;
}
