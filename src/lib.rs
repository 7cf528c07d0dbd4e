//! slamon - SLA monitoring agent
//!
//! Watches support tickets against their service level agreements, scores
//! how badly each one is slipping, and decides who needs to hear about it.
//!
//! # Architecture
//!
//! - **Types**: tickets, delayed portions, escalation records
//! - **Storage**: the [`TicketStore`] trait with a libSQL backend and seeding
//! - **Reasoning**: context building, severity scoring, batch assessment
//! - **Escalation**: maps scored tickets onto the escalation matrix
//! - **Report**: daily operations report and metrics snapshots
//! - **Agent**: the operations exposed to the CLI and dashboard
//! - **Dashboard**: the four-action shell hosted by `slamon-dash`
//!
//! # Example
//!
//! ```ignore
//! use slamon_core::{SlaAgent, SlaConfig, StdoutSink, MonitoringAgent};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SlaConfig::load(None)?;
//!     let agent = SlaAgent::open(config, Arc::new(StdoutSink)).await?;
//!     let outcome = agent.run_daily_analysis().await?;
//!     println!("{} escalations", outcome.escalations.len());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod escalation;
pub mod metrics;
pub mod output;
pub mod reasoning;
pub mod report;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use agent::{
    AgentFactory, ConfiguredAgentFactory, DailyOutcome, MonitoringAgent, SelfTest,
    SelfTestOutcome, SlaAgent,
};
pub use config::SlaConfig;
pub use dashboard::{DashboardAction, DashboardShell, RunResult, ShellState};
pub use error::{Result, SlaError};
pub use escalation::{EscalationManager, EscalationPlan};
pub use output::{BufferSink, ChannelSink, OutputEvent, OutputSink, StdoutSink};
pub use reasoning::{AnalysisContext, ReasoningEngine, TicketDecision};
pub use storage::{ConnectionMode, LibsqlStore, TicketFilter, TicketStore};
pub use types::{
    DelayPortion, EscalationRecord, Priority, SlaStatus, Ticket, TicketId, TicketStatus,
};
