//! SLA monitoring agent
//!
//! Wires the store, reasoning engine, escalation manager and report writer
//! into the operations exposed to the CLI and dashboard. All progress is
//! emitted through the agent's [`OutputSink`]; every operation also returns
//! a structured outcome.

use crate::config::SlaConfig;
use crate::error::{Result, SlaError};
use crate::escalation::{EscalationManager, EscalationPlan};
use crate::output::{OutputEvent, OutputSink};
use crate::reasoning::{
    escalation_level, AnalysisContext, BatchAnalysis, ReasoningEngine, TicketDecision,
};
use crate::report::{DailyReport, MetricsReport, ReportWriter};
use crate::storage::{ConnectionMode, LibsqlStore, TicketFilter, TicketStore};
use crate::types::{
    CustomerTier, DelayPortion, Priority, SlaStatus, Ticket, TicketId, TicketStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PROGRESS_EVERY: usize = 10;

/// Synthetic decisions fed to the escalation manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationProbe {
    pub severities: Vec<u8>,
}

impl Default for EscalationProbe {
    fn default() -> Self {
        Self {
            severities: vec![9, 6],
        }
    }
}

/// Context building over stored tickets in a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextProbe {
    pub hours_back: u32,
}

impl Default for ContextProbe {
    fn default() -> Self {
        Self { hours_back: 24 }
    }
}

/// Reasoning over fixture tickets; `None` uses the built-in set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningProbe {
    pub tickets: Option<Vec<Ticket>>,
}

/// A self test the agent can run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelfTest {
    Escalation(EscalationProbe),
    Context(ContextProbe),
    Reasoning(ReasoningProbe),
}

impl SelfTest {
    pub fn name(&self) -> &'static str {
        match self {
            SelfTest::Escalation(_) => "escalation",
            SelfTest::Context(_) => "context",
            SelfTest::Reasoning(_) => "reasoning",
        }
    }
}

impl fmt::Display for SelfTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SelfTest {
    type Err = SlaError;

    /// Parses a test name into the test with default parameters
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "escalation" => Ok(SelfTest::Escalation(EscalationProbe::default())),
            "context" => Ok(SelfTest::Context(ContextProbe::default())),
            "reasoning" => Ok(SelfTest::Reasoning(ReasoningProbe::default())),
            other => Err(SlaError::Validation(format!(
                "Unknown self test '{}' (expected escalation, context or reasoning)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelfTestOutcome {
    Escalation { plans: Vec<EscalationPlan> },
    Context { context: AnalysisContext },
    Reasoning { decisions: Vec<TicketDecision> },
}

/// What a daily analysis produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyOutcome {
    /// `None` when the window held no tickets
    pub context: Option<AnalysisContext>,
    pub decisions: Vec<TicketDecision>,
    pub escalations: Vec<EscalationPlan>,
    pub persisted_escalations: usize,
    pub report: Option<DailyReport>,
    pub report_path: Option<PathBuf>,
}

/// Operations the dashboard shell dispatches to
#[async_trait]
pub trait MonitoringAgent: Send + Sync {
    async fn run_daily_analysis(&self) -> Result<DailyOutcome>;

    async fn run_self_test(&self, test: SelfTest) -> Result<SelfTestOutcome>;
}

/// Builds a fresh agent for each dashboard run
#[async_trait]
pub trait AgentFactory: Send + Sync {
    async fn create(&self, out: Arc<dyn OutputSink>) -> Result<Box<dyn MonitoringAgent>>;
}

/// Opens the configured database for every agent it creates
pub struct ConfiguredAgentFactory {
    config: SlaConfig,
}

impl ConfiguredAgentFactory {
    pub fn new(config: SlaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AgentFactory for ConfiguredAgentFactory {
    async fn create(&self, out: Arc<dyn OutputSink>) -> Result<Box<dyn MonitoringAgent>> {
        let agent = SlaAgent::open(self.config.clone(), out).await?;
        Ok(Box::new(agent))
    }
}

pub struct SlaAgent {
    store: Arc<dyn TicketStore>,
    engine: ReasoningEngine,
    escalations: EscalationManager,
    writer: ReportWriter,
    config: SlaConfig,
    out: Arc<dyn OutputSink>,
    fixed_now: Option<DateTime<Utc>>,
}

impl SlaAgent {
    pub fn new(config: SlaConfig, store: Arc<dyn TicketStore>, out: Arc<dyn OutputSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: ReasoningEngine::new(&config.reasoning),
            escalations: EscalationManager::new(&config.escalation)?,
            writer: ReportWriter::new(config.app.reports_dir.clone()),
            store,
            config,
            out,
            fixed_now: None,
        })
    }

    /// Open the configured database (which must already exist)
    pub async fn open(config: SlaConfig, out: Arc<dyn OutputSink>) -> Result<Self> {
        let path = config.database.path.to_string_lossy().to_string();
        let store = LibsqlStore::new(ConnectionMode::Local(path)).await?;
        Self::new(config, Arc::new(store), out)
    }

    /// Pin the clock, for reproducible output
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn config(&self) -> &SlaConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn TicketStore> {
        &self.store
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    fn line(&self, text: impl AsRef<str>) {
        self.out.line(text.as_ref());
    }

    async fn delays_by_ticket(&self, tickets: &[Ticket]) -> Result<HashMap<TicketId, Vec<DelayPortion>>> {
        let ids: Vec<TicketId> = tickets.iter().map(|t| t.id.clone()).collect();
        let mut grouped: HashMap<TicketId, Vec<DelayPortion>> = HashMap::new();
        for delay in self.store.delays_for(&ids).await? {
            grouped.entry(delay.ticket_id.clone()).or_default().push(delay);
        }
        Ok(grouped)
    }

    async fn daily_analysis(&self) -> Result<DailyOutcome> {
        let now = self.now();
        let window = self.config.reasoning.analysis_window_hours;
        info!("Starting daily analysis over the last {} hours", window);

        self.out.section("1️⃣ Fetching tickets for analysis");
        self.store.health_check().await?;
        let since = window_start(now, Duration::try_hours(window as i64), "analysis window")?;
        let tickets = self.store.tickets_since(since).await?;
        if tickets.is_empty() {
            self.line("No tickets found for analysis");
            return Ok(DailyOutcome::default());
        }
        self.line(format!("Retrieved {} tickets", tickets.len()));

        self.out.section("2️⃣ Building analysis context");
        let context = self.engine.build_context(&tickets);
        self.line(format!(
            "✅ Context built: {} delayed tickets out of {}",
            context.delayed_count, context.total_tickets
        ));

        self.out.section("3️⃣ Analyzing individual tickets");
        let delays = self.delays_by_ticket(&tickets).await?;
        let mut decisions = Vec::with_capacity(tickets.len());
        for ticket in &tickets {
            let ticket_delays = delays.get(&ticket.id).map(Vec::as_slice).unwrap_or(&[]);
            decisions.push(self.engine.reason_about_ticket(ticket, ticket_delays, now));
            if decisions.len() % PROGRESS_EVERY == 0 {
                self.out.emit(OutputEvent::Progress {
                    done: decisions.len(),
                    total: tickets.len(),
                });
            }
        }

        self.out.section("4️⃣ Processing escalations");
        let escalations = self.escalations.process(&decisions, now);
        if escalations.is_empty() {
            self.line("✅ No escalations needed");
        } else {
            self.line(format!("📤 Processing {} escalations...", escalations.len()));
        }
        let persisted = if self.escalations.persists() && !escalations.is_empty() {
            let n = self.escalations.persist(self.store.as_ref(), &escalations).await?;
            self.line(format!("💾 Recorded {} escalations", n));
            n
        } else {
            0
        };

        self.out.section("5️⃣ Generating daily operations report");
        let report = DailyReport::generate(&context, &decisions, &escalations, now);

        self.out.section("📊 RESULTS SUMMARY");
        for line in report.summary_lines() {
            self.line(line);
        }

        let report_path = match self.writer.save_daily(&report) {
            Ok(path) => {
                self.line(format!("💾 Report saved to: {}", path.display()));
                Some(path)
            }
            Err(e) => {
                warn!("Failed to save daily report: {}", e);
                self.line(format!("⚠️  Could not save report: {}", e));
                None
            }
        };

        info!(
            "Daily analysis complete: {} tickets, {} escalations",
            decisions.len(),
            escalations.len()
        );
        Ok(DailyOutcome {
            context: Some(context),
            decisions,
            escalations,
            persisted_escalations: persisted,
            report: Some(report),
            report_path,
        })
    }

    fn escalation_test(&self, probe: &EscalationProbe) -> SelfTestOutcome {
        let threshold = self.engine.escalation_threshold();
        let decisions: Vec<TicketDecision> = probe
            .severities
            .iter()
            .enumerate()
            .map(|(i, &severity)| TicketDecision {
                ticket_id: TicketId(format!("TEST-{:03}", i + 1)),
                severity,
                insights: vec![format!("Synthetic severity {}", severity)],
                recommended_actions: vec!["Review escalation routing".to_string()],
                needs_escalation: severity >= threshold,
                escalation_level: escalation_level(severity),
            })
            .collect();

        let plans = self.escalations.process(&decisions, self.now());
        self.line(format!(
            "✅ Escalation test: {} escalations generated",
            plans.len()
        ));
        for plan in &plans {
            self.line(format!(
                "  • {} -> Level {} to {} within {}",
                plan.ticket_id, plan.level, plan.target, plan.timeframe
            ));
        }
        SelfTestOutcome::Escalation { plans }
    }

    async fn context_test(&self, probe: &ContextProbe) -> Result<SelfTestOutcome> {
        let since = window_start(
            self.now(),
            Duration::try_hours(probe.hours_back as i64),
            "context window",
        )?;
        let tickets = self.store.tickets_since(since).await?;
        let context = self.engine.build_context(&tickets);

        self.line(format!(
            "✅ Context test: {} tickets in the last {} hours, {} delayed ({:.1}%)",
            context.total_tickets, probe.hours_back, context.delayed_count, context.delayed_percentage
        ));
        self.line(format!(
            "  • {} priorities, {} services, {} teams",
            context.by_priority.len(),
            context.by_service.len(),
            context.by_team.len()
        ));
        for (team, stats) in &context.by_team {
            self.line(format!("  • {}: {}/{} delayed", team, stats.delayed, stats.total));
        }
        Ok(SelfTestOutcome::Context { context })
    }

    fn reasoning_test(&self, probe: &ReasoningProbe) -> SelfTestOutcome {
        let now = self.now();
        let tickets = probe
            .tickets
            .clone()
            .unwrap_or_else(|| fixture_tickets(now));

        let decisions: Vec<TicketDecision> = tickets
            .iter()
            .map(|t| self.engine.reason_about_ticket(t, &[], now))
            .collect();

        self.line(format!(
            "✅ Reasoning test: {} tickets analysed",
            decisions.len()
        ));
        for d in &decisions {
            self.line(format!(
                "  • {}: severity {}/10, level {}, escalate: {}",
                d.ticket_id,
                d.severity,
                d.escalation_level,
                if d.needs_escalation { "yes" } else { "no" }
            ));
        }
        SelfTestOutcome::Reasoning { decisions }
    }

    /// Batch risk assessment over the most urgent stored tickets
    pub async fn assess(&self, limit: usize) -> Result<BatchAnalysis> {
        let tickets = self.store.tickets(&TicketFilter::default(), limit).await?;
        if tickets.is_empty() {
            self.line("No tickets found for analysis");
            return Ok(BatchAnalysis::default());
        }

        self.line(format!("Analyzing {} tickets...", tickets.len()));
        let batch = self.engine.assess_batch(&tickets, self.now());

        self.out.section("📊 Analysis Results");
        self.line(format!("Total tickets analyzed: {}", batch.total_analyzed));
        self.line(format!("Critical tickets: {}", batch.critical));
        self.line(format!("High risk tickets: {}", batch.high_risk));
        self.line(format!("Escalations needed: {}", batch.escalations_needed));
        self.line(format!("Average severity: {:.1}/10", batch.avg_severity));

        self.out.section("🚨 Top 3 Issues");
        for (i, issue) in batch.top_issues.iter().take(3).enumerate() {
            self.line(format!(
                "{}. {}: Severity {}/10 - {} risk",
                i + 1,
                issue.ticket_id,
                issue.severity,
                issue.risk_level
            ));
        }
        Ok(batch)
    }

    /// Escalation plans for breached tickets
    pub async fn escalate_breached(&self, limit: usize) -> Result<Vec<EscalationPlan>> {
        let filter = TicketFilter::default().with_sla_status(SlaStatus::Breached);
        let tickets = self.store.tickets(&filter, limit).await?;
        if tickets.is_empty() {
            self.line("No breached tickets found");
            return Ok(Vec::new());
        }

        let now = self.now();
        let batch = self.engine.assess_batch(&tickets, now);
        self.line(format!("Processing {} ticket analyses...", batch.assessments.len()));
        let plans = self.escalations.process(&batch.assessments, now);

        self.out.section("📤 Escalation Results");
        self.line(format!("Total escalations needed: {}", plans.len()));
        for plan in &plans {
            self.line(String::new());
            self.line(format!("Ticket: {}", plan.ticket_id));
            self.line(format!("Escalation Level: {}", plan.level));
            self.line(format!("Severity: {}/10", plan.severity));
            self.line(format!("Target: {}", plan.target));
            self.line(format!("Urgency: {}", plan.urgency));
            self.line(format!("Deadline: {}", plan.deadline.format("%Y-%m-%d %H:%M UTC")));
        }

        if self.escalations.persists() && !plans.is_empty() {
            let n = self.escalations.persist(self.store.as_ref(), &plans).await?;
            self.line(format!("💾 Recorded {} escalations", n));
        }
        Ok(plans)
    }

    /// Write a metrics report covering the last `days` days
    pub async fn metrics_report(&self, days: u32) -> Result<(MetricsReport, PathBuf)> {
        let now = self.now();
        let since = window_start(now, Duration::try_days(days as i64), "report period")?;
        let metrics = self.store.sla_metrics(since).await?;
        let report = MetricsReport::new(metrics, days, now);
        let path = self.writer.save_metrics(&report)?;

        let m = &report.metrics;
        self.line(format!("✅ Report saved to {}", path.display()));
        self.out.section("📊 Key Metrics");
        self.line(format!("Total tickets: {}", m.total_tickets));
        self.line(format!("SLA compliance: {}%", m.compliance_rate));
        self.line(format!("Breached tickets: {}", m.breached));
        self.line(format!("At risk tickets: {}", m.at_risk));
        self.line(format!("Average delay: {:.1} minutes", m.avg_delay_minutes));
        Ok((report, path))
    }
}

#[async_trait]
impl MonitoringAgent for SlaAgent {
    async fn run_daily_analysis(&self) -> Result<DailyOutcome> {
        self.daily_analysis().await
    }

    async fn run_self_test(&self, test: SelfTest) -> Result<SelfTestOutcome> {
        debug!("Running {} self test", test);
        self.out.section(&format!("🧪 Running {} test", test));
        match &test {
            SelfTest::Escalation(probe) => Ok(self.escalation_test(probe)),
            SelfTest::Context(probe) => self.context_test(probe).await,
            SelfTest::Reasoning(probe) => Ok(self.reasoning_test(probe)),
        }
    }
}

/// Start of a look-back window ending at `now`
fn window_start(now: DateTime<Utc>, span: Option<Duration>, what: &str) -> Result<DateTime<Utc>> {
    span.and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| SlaError::Validation(format!("{} is out of range", what)))
}

/// Built-in tickets covering each severity band
pub fn fixture_tickets(now: DateTime<Utc>) -> Vec<Ticket> {
    let mk = |id: &str,
              priority: Priority,
              sla_status: SlaStatus,
              delay_minutes: i64,
              hours_left: i64,
              tier: CustomerTier| {
        let created_at = now - Duration::hours(6);
        Ticket {
            id: TicketId::new(id),
            title: format!("Fixture {}", id),
            service: "API Monitoring".to_string(),
            customer: Some("Fixture Customer".to_string()),
            customer_tier: Some(tier),
            priority,
            status: TicketStatus::InProgress,
            created_at,
            resolution_deadline: now + Duration::hours(hours_left),
            resolved_at: None,
            assigned_team: "Team A".to_string(),
            sla_status,
            delay_minutes,
        }
    };

    vec![
        mk("FIX-001", Priority::P1, SlaStatus::Breached, 300, -2, CustomerTier::Platinum),
        mk("FIX-002", Priority::P2, SlaStatus::AtRisk, 45, 2, CustomerTier::Enterprise),
        mk("FIX-003", Priority::P3, SlaStatus::Delayed, 90, 10, CustomerTier::Premium),
        mk("FIX-004", Priority::P4, SlaStatus::WithinSla, 0, 30, CustomerTier::Basic),
    ]
}
