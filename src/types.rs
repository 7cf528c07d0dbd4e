//! Core data types for the SLA monitoring agent
//!
//! Tickets, delayed portions and escalation records as they are stored,
//! plus the enumerations that classify them. String forms match the
//! values persisted in the database.

use crate::error::{Result, SlaError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ticket identifier (e.g. `TKT-20260114-1003`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Ticket priority, P1 being the most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::P1,
        Priority::P2,
        Priority::P3,
        Priority::P4,
        Priority::P5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
            Priority::P4 => "P4",
            Priority::P5 => "P5",
        }
    }

    /// Whether this priority demands regular stakeholder updates
    pub fn is_high(&self) -> bool {
        matches!(self, Priority::P1 | Priority::P2)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Priority::P1),
            "P2" => Ok(Priority::P2),
            "P3" => Ok(Priority::P3),
            "P4" => Ok(Priority::P4),
            "P5" => Ok(Priority::P5),
            other => Err(SlaError::Validation(format!("Invalid priority: {}", other))),
        }
    }
}

/// SLA compliance status of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    WithinSla,
    Delayed,
    AtRisk,
    Breached,
}

impl SlaStatus {
    pub const ALL: [SlaStatus; 4] = [
        SlaStatus::WithinSla,
        SlaStatus::Delayed,
        SlaStatus::AtRisk,
        SlaStatus::Breached,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlaStatus::WithinSla => "within_sla",
            SlaStatus::Delayed => "delayed",
            SlaStatus::AtRisk => "at_risk",
            SlaStatus::Breached => "breached",
        }
    }

    /// Anything other than within_sla counts as delayed for reporting
    pub fn is_delayed(&self) -> bool {
        !matches!(self, SlaStatus::WithinSla)
    }
}

impl fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SlaStatus {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "within_sla" => Ok(SlaStatus::WithinSla),
            "delayed" => Ok(SlaStatus::Delayed),
            "at_risk" => Ok(SlaStatus::AtRisk),
            "breached" => Ok(SlaStatus::Breached),
            other => Err(SlaError::Validation(format!("Invalid SLA status: {}", other))),
        }
    }
}

/// Workflow status of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    InProgress,
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::New,
        TicketStatus::InProgress,
        TicketStatus::Pending,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "new" => Ok(TicketStatus::New),
            "in_progress" => Ok(TicketStatus::InProgress),
            "pending" => Ok(TicketStatus::Pending),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(SlaError::Validation(format!("Invalid ticket status: {}", other))),
        }
    }
}

/// Commercial tier of the customer that raised a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerTier {
    Basic,
    Premium,
    Enterprise,
    Platinum,
}

impl CustomerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerTier::Basic => "Basic",
            CustomerTier::Premium => "Premium",
            CustomerTier::Enterprise => "Enterprise",
            CustomerTier::Platinum => "Platinum",
        }
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CustomerTier {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Basic" => Ok(CustomerTier::Basic),
            "Premium" => Ok(CustomerTier::Premium),
            "Enterprise" => Ok(CustomerTier::Enterprise),
            "Platinum" => Ok(CustomerTier::Platinum),
            other => Err(SlaError::Validation(format!("Invalid customer tier: {}", other))),
        }
    }
}

/// Category of a delayed portion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayType {
    Response,
    Resolution,
    CustomerWaiting,
    Internal,
}

impl DelayType {
    pub const ALL: [DelayType; 4] = [
        DelayType::Response,
        DelayType::Resolution,
        DelayType::CustomerWaiting,
        DelayType::Internal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DelayType::Response => "response",
            DelayType::Resolution => "resolution",
            DelayType::CustomerWaiting => "customer_waiting",
            DelayType::Internal => "internal",
        }
    }
}

impl FromStr for DelayType {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "response" => Ok(DelayType::Response),
            "resolution" => Ok(DelayType::Resolution),
            "customer_waiting" => Ok(DelayType::CustomerWaiting),
            "internal" => Ok(DelayType::Internal),
            other => Err(SlaError::Validation(format!("Invalid delay type: {}", other))),
        }
    }
}

/// Progress of a delayed portion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayStatus {
    Pending,
    InProgress,
    Resolved,
    Failed,
}

impl DelayStatus {
    pub const ALL: [DelayStatus; 4] = [
        DelayStatus::Pending,
        DelayStatus::InProgress,
        DelayStatus::Resolved,
        DelayStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DelayStatus::Pending => "pending",
            DelayStatus::InProgress => "in_progress",
            DelayStatus::Resolved => "resolved",
            DelayStatus::Failed => "failed",
        }
    }

    /// A delay still holding the ticket back
    pub fn is_active(&self) -> bool {
        matches!(self, DelayStatus::Pending | DelayStatus::InProgress)
    }
}

impl FromStr for DelayStatus {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "pending" => Ok(DelayStatus::Pending),
            "in_progress" => Ok(DelayStatus::InProgress),
            "resolved" => Ok(DelayStatus::Resolved),
            "failed" => Ok(DelayStatus::Failed),
            other => Err(SlaError::Validation(format!("Invalid delay status: {}", other))),
        }
    }
}

/// Lifecycle of a stored escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    Active,
    Pending,
    Resolved,
}

impl EscalationStatus {
    pub const ALL: [EscalationStatus; 3] = [
        EscalationStatus::Active,
        EscalationStatus::Pending,
        EscalationStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationStatus::Active => "active",
            EscalationStatus::Pending => "pending",
            EscalationStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for EscalationStatus {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "active" => Ok(EscalationStatus::Active),
            "pending" => Ok(EscalationStatus::Pending),
            "resolved" => Ok(EscalationStatus::Resolved),
            other => Err(SlaError::Validation(format!(
                "Invalid escalation status: {}",
                other
            ))),
        }
    }
}

/// A support ticket tracked against its SLA
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub service: String,
    pub customer: Option<String>,
    pub customer_tier: Option<CustomerTier>,
    pub priority: Priority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub resolution_deadline: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub assigned_team: String,
    pub sla_status: SlaStatus,
    pub delay_minutes: i64,
}

impl Ticket {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Hours remaining until the resolution deadline (negative once passed)
    pub fn hours_to_deadline(&self, now: DateTime<Utc>) -> f64 {
        (self.resolution_deadline - now).num_seconds() as f64 / 3600.0
    }
}

/// A stretch of time during which a ticket was held up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayPortion {
    pub id: Option<i64>,
    pub ticket_id: TicketId,
    pub delay_type: DelayType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    pub status: DelayStatus,
    pub impact_score: u8,
    pub resolution_notes: String,
}

/// A persisted escalation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub id: Option<i64>,
    pub ticket_id: TicketId,
    pub level: u8,
    pub reason: String,
    pub escalated_at: DateTime<Utc>,
    pub status: EscalationStatus,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Parse an RFC 3339 timestamp stored as TEXT
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SlaError::Validation(format!("Invalid timestamp '{}': {}", value, e)))
}

/// Format a timestamp the way it is stored (second precision, `Z` suffix)
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
