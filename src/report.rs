//! Daily operations report and metrics report
//!
//! Reports are plain serde structs written as pretty JSON. The daily
//! report summarises one analysis run; the metrics report snapshots
//! store-level SLA metrics over a number of days.

use crate::error::Result;
use crate::escalation::EscalationPlan;
use crate::metrics::{percentage, SlaMetrics};
use crate::reasoning::{AnalysisContext, TicketDecision};
use crate::types::TicketId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const CRITICAL_SEVERITY: u8 = 8;
const MAX_CRITICAL_ISSUES: usize = 10;
const MAX_RECOMMENDATIONS: usize = 5;
const FILE_STAMP: &str = "%Y%m%d_%H%M%S_%3f";
const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
    Good,
    Warning,
    Critical,
}

impl Health {
    pub fn from_delayed_percentage(pct: f64) -> Self {
        if pct < 20.0 {
            Health::Good
        } else if pct < 40.0 {
            Health::Warning
        } else {
            Health::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Good => "GOOD",
            Health::Warning => "WARNING",
            Health::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamPerformance {
    Good,
    NeedsAttention,
    Critical,
}

impl TeamPerformance {
    pub fn from_delayed_percentage(pct: f64) -> Self {
        if pct < 20.0 {
            TeamPerformance::Good
        } else if pct < 40.0 {
            TeamPerformance::NeedsAttention
        } else {
            TeamPerformance::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TeamPerformance::Good => "GOOD",
            TeamPerformance::NeedsAttention => "NEEDS_ATTENTION",
            TeamPerformance::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub total_tickets_monitored: usize,
    pub delayed_tickets: usize,
    pub delayed_percentage: f64,
    pub critical_tickets: usize,
    pub overall_health: Health,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaPerformance {
    pub within_sla_count: usize,
    pub within_sla_percentage: f64,
    pub breached_count: usize,
    pub breached_percentage: f64,
    pub avg_severity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalIssue {
    pub ticket_id: TicketId,
    pub severity: u8,
    pub top_insight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamReport {
    pub team: String,
    pub total_tickets: usize,
    pub delayed_tickets: usize,
    pub delayed_percentage: f64,
    pub performance: TeamPerformance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscalationAnalysis {
    pub total_escalations: usize,
    pub by_level: BTreeMap<u8, usize>,
    pub highest_level: u8,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub report_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub executive_summary: ExecutiveSummary,
    /// Absent when no ticket was analysed
    pub sla_performance: Option<SlaPerformance>,
    pub critical_issues: Vec<CriticalIssue>,
    pub team_analysis: Vec<TeamReport>,
    pub escalation_analysis: EscalationAnalysis,
    pub recommendations: Vec<String>,
    /// Count of decisions per severity bucket 1..=10
    pub severity_distribution: BTreeMap<u8, usize>,
}

impl DailyReport {
    pub fn generate(
        context: &AnalysisContext,
        decisions: &[TicketDecision],
        escalations: &[EscalationPlan],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            report_date: now.date_naive(),
            generated_at: now,
            executive_summary: executive_summary(context, decisions),
            sla_performance: sla_performance(decisions),
            critical_issues: critical_issues(decisions),
            team_analysis: team_analysis(context),
            escalation_analysis: escalation_analysis(escalations),
            recommendations: recommendations(context, decisions),
            severity_distribution: severity_distribution(decisions),
        }
    }

    /// Console rendering of the report
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let s = &self.executive_summary;
        lines.push("📈 Executive Summary:".to_string());
        lines.push(format!("  • Tickets Monitored: {}", s.total_tickets_monitored));
        lines.push(format!(
            "  • Delayed Tickets: {} ({:.1}%)",
            s.delayed_tickets, s.delayed_percentage
        ));
        lines.push(format!("  • Critical Tickets: {}", s.critical_tickets));
        lines.push(format!("  • Overall Health: {}", s.overall_health.as_str()));

        if let Some(perf) = &self.sla_performance {
            lines.push(String::new());
            lines.push("🎯 SLA Performance:".to_string());
            lines.push(format!(
                "  • Within SLA: {} ({:.1}%)",
                perf.within_sla_count, perf.within_sla_percentage
            ));
            lines.push(format!(
                "  • Breached: {} ({:.1}%)",
                perf.breached_count, perf.breached_percentage
            ));
            lines.push(format!("  • Average Severity: {:.1}/10", perf.avg_severity));
        }

        if !self.critical_issues.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "🚨 Critical Issues (Top {}):",
                self.critical_issues.len()
            ));
            for issue in self.critical_issues.iter().take(3) {
                lines.push(format!(
                    "  • {}: Severity {}/10 - {}",
                    issue.ticket_id, issue.severity, issue.top_insight
                ));
            }
        }

        if !self.team_analysis.is_empty() {
            let mut teams: Vec<&TeamReport> = self.team_analysis.iter().collect();
            teams.sort_by(|a, b| b.delayed_percentage.total_cmp(&a.delayed_percentage));
            lines.push(String::new());
            lines.push("👥 Team Performance:".to_string());
            for team in teams.into_iter().take(3) {
                lines.push(format!(
                    "  • {}: {:.1}% delayed ({})",
                    team.team,
                    team.delayed_percentage,
                    team.performance.as_str()
                ));
            }
        }

        lines.push(String::new());
        lines.push("📤 Escalations:".to_string());
        lines.push(format!(
            "  • Total: {}",
            self.escalation_analysis.total_escalations
        ));
        for (level, count) in &self.escalation_analysis.by_level {
            lines.push(format!("  • Level {}: {}", level, count));
        }

        if !self.recommendations.is_empty() {
            lines.push(String::new());
            lines.push("💡 Top Recommendations:".to_string());
            for rec in &self.recommendations {
                lines.push(format!("  • {}", rec));
            }
        }
        lines
    }
}

fn critical_count(decisions: &[TicketDecision]) -> usize {
    decisions
        .iter()
        .filter(|d| d.severity >= CRITICAL_SEVERITY)
        .count()
}

fn executive_summary(context: &AnalysisContext, decisions: &[TicketDecision]) -> ExecutiveSummary {
    ExecutiveSummary {
        total_tickets_monitored: context.total_tickets,
        delayed_tickets: context.delayed_count,
        delayed_percentage: context.delayed_percentage,
        critical_tickets: critical_count(decisions),
        overall_health: Health::from_delayed_percentage(context.delayed_percentage),
    }
}

fn sla_performance(decisions: &[TicketDecision]) -> Option<SlaPerformance> {
    if decisions.is_empty() {
        return None;
    }
    let total = decisions.len();
    let within = decisions.iter().filter(|d| d.severity <= 3).count();
    let breached = critical_count(decisions);
    let severity_sum: u32 = decisions.iter().map(|d| d.severity as u32).sum();

    Some(SlaPerformance {
        within_sla_count: within,
        within_sla_percentage: percentage(within, total),
        breached_count: breached,
        breached_percentage: percentage(breached, total),
        avg_severity: severity_sum as f64 / total as f64,
    })
}

fn critical_issues(decisions: &[TicketDecision]) -> Vec<CriticalIssue> {
    decisions
        .iter()
        .filter(|d| d.severity >= CRITICAL_SEVERITY)
        .take(MAX_CRITICAL_ISSUES)
        .map(|d| CriticalIssue {
            ticket_id: d.ticket_id.clone(),
            severity: d.severity,
            top_insight: d
                .insights
                .first()
                .cloned()
                .unwrap_or_else(|| "No insights".to_string()),
        })
        .collect()
}

fn team_analysis(context: &AnalysisContext) -> Vec<TeamReport> {
    context
        .by_team
        .iter()
        .filter(|(_, stats)| stats.total > 0)
        .map(|(team, stats)| {
            let pct = stats.delayed_percentage();
            TeamReport {
                team: team.clone(),
                total_tickets: stats.total,
                delayed_tickets: stats.delayed,
                delayed_percentage: pct,
                performance: TeamPerformance::from_delayed_percentage(pct),
            }
        })
        .collect()
}

fn escalation_analysis(plans: &[EscalationPlan]) -> EscalationAnalysis {
    if plans.is_empty() {
        return EscalationAnalysis {
            summary: "No escalations needed".to_string(),
            ..Default::default()
        };
    }

    let mut by_level = BTreeMap::new();
    for plan in plans {
        *by_level.entry(plan.level).or_insert(0) += 1;
    }
    EscalationAnalysis {
        total_escalations: plans.len(),
        highest_level: by_level.keys().next_back().copied().unwrap_or(0),
        by_level,
        summary: format!("{} escalations processed", plans.len()),
    }
}

fn recommendations(context: &AnalysisContext, decisions: &[TicketDecision]) -> Vec<String> {
    let mut recs = Vec::new();

    for (team, stats) in &context.by_team {
        if stats.total > 5 && stats.delayed_ratio() > 0.3 {
            recs.push(format!(
                "👥 {}: High delay rate ({}/{}). Consider resource review.",
                team, stats.delayed, stats.total
            ));
        }
    }

    for (priority, stats) in &context.by_priority {
        if stats.total > 0 && stats.delayed_ratio() > 0.4 {
            recs.push(format!(
                "🎯 Priority {}: {}/{} delayed. Review prioritization process.",
                priority, stats.delayed, stats.total
            ));
        }
    }

    let critical = critical_count(decisions);
    if critical > 3 {
        recs.push(format!(
            "🚨 Critical Issues: {} critical tickets need immediate attention.",
            critical
        ));
    }

    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

fn severity_distribution(decisions: &[TicketDecision]) -> BTreeMap<u8, usize> {
    let mut dist: BTreeMap<u8, usize> = (1..=10).map(|bucket| (bucket, 0)).collect();
    for decision in decisions {
        let bucket = decision.severity.clamp(1, 10);
        *dist.entry(bucket).or_insert(0) += 1;
    }
    dist
}

/// Store-level SLA metrics over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub report_date: DateTime<Utc>,
    pub period_days: u32,
    pub metrics: SlaMetrics,
    pub generated_by: String,
}

impl MetricsReport {
    pub fn new(metrics: SlaMetrics, period_days: u32, now: DateTime<Utc>) -> Self {
        Self {
            report_date: now,
            period_days,
            metrics,
            generated_by: format!("slamon {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Writes reports into a directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_daily(&self, report: &DailyReport) -> Result<PathBuf> {
        let stem = format!(
            "sla_agent_report_{}",
            report.generated_at.format(FILE_STAMP)
        );
        self.write_json(&stem, report)
    }

    pub fn save_metrics(&self, report: &MetricsReport) -> Result<PathBuf> {
        let stem = format!("sla_report_{}", report.report_date.format(FILE_STAMP));
        self.write_json(&stem, report)
    }

    /// Write to `<stem>.json`, or `<stem>_<n>.json` if that name is taken
    fn write_json<T: Serialize>(&self, stem: &str, value: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = match attempt {
                0 => format!("{}.json", stem),
                n => format!("{}_{}.json", stem, n),
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())?;
                    info!("Report written to {}", path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free report name for {} in {}", stem, self.dir.display()),
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::build_context;
    use crate::reasoning::tests::{fixed_now, ticket};
    use crate::types::{Priority, SlaStatus};

    fn decision(id: &str, severity: u8) -> TicketDecision {
        TicketDecision {
            ticket_id: TicketId::new(id),
            severity,
            insights: vec![format!("first insight {}", id)],
            recommended_actions: Vec::new(),
            needs_escalation: severity >= 8,
            escalation_level: crate::reasoning::escalation_level(severity),
        }
    }

    #[test]
    fn test_health_thresholds() {
        assert_eq!(Health::from_delayed_percentage(19.9), Health::Good);
        assert_eq!(Health::from_delayed_percentage(20.0), Health::Warning);
        assert_eq!(Health::from_delayed_percentage(39.9), Health::Warning);
        assert_eq!(Health::from_delayed_percentage(40.0), Health::Critical);
    }

    #[test]
    fn test_performance_absent_without_decisions() {
        let ctx = build_context(&[]);
        let report = DailyReport::generate(&ctx, &[], &[], fixed_now());
        assert!(report.sla_performance.is_none());
        assert_eq!(report.escalation_analysis.summary, "No escalations needed");
        assert_eq!(report.severity_distribution.len(), 10);
        assert!(report.severity_distribution.values().all(|c| *c == 0));
    }

    #[test]
    fn test_sections_from_decisions() {
        let tickets: Vec<_> = (0..6)
            .map(|i| ticket(&format!("TKT-{}", i), Priority::P1, SlaStatus::Breached, 0))
            .collect();
        let ctx = build_context(&tickets);
        let decisions: Vec<_> = (0..6)
            .map(|i| decision(&format!("TKT-{}", i), if i < 4 { 9 } else { 0 }))
            .collect();

        let report = DailyReport::generate(&ctx, &decisions, &[], fixed_now());
        assert_eq!(report.executive_summary.critical_tickets, 4);
        assert_eq!(report.executive_summary.overall_health, Health::Critical);

        let perf = report.sla_performance.as_ref().unwrap();
        assert_eq!(perf.within_sla_count, 2);
        assert_eq!(perf.breached_count, 4);
        assert_eq!(perf.avg_severity, 6.0);

        assert_eq!(report.critical_issues.len(), 4);
        assert_eq!(report.critical_issues[0].top_insight, "first insight TKT-0");

        // severity 0 lands in bucket 1
        assert_eq!(report.severity_distribution[&1], 2);
        assert_eq!(report.severity_distribution[&9], 4);

        // team, priority and critical-count recommendations all fire
        assert_eq!(report.recommendations.len(), 3);
        assert_eq!(report.team_analysis[0].performance, TeamPerformance::Critical);
    }

    #[test]
    fn test_critical_issues_capped_at_ten() {
        let ctx = build_context(&[]);
        let decisions: Vec<_> = (0..15).map(|i| decision(&format!("T-{}", i), 10)).collect();
        let report = DailyReport::generate(&ctx, &decisions, &[], fixed_now());
        assert_eq!(report.critical_issues.len(), 10);
    }

    #[test]
    fn test_save_daily_report_filename() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());
        let ctx = build_context(&[]);
        let report = DailyReport::generate(&ctx, &[], &[], fixed_now());

        let path = writer.save_daily(&report).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "sla_agent_report_20260302_120000_000.json"
        );
        let saved: DailyReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.report_date, report.report_date);
    }

    #[test]
    fn test_reports_with_same_timestamp_keep_both_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());
        let ctx = build_context(&[]);
        let report = DailyReport::generate(&ctx, &[], &[], fixed_now());

        let first = writer.save_daily(&report).unwrap();
        let second = writer.save_daily(&report).unwrap();
        assert_ne!(first, second);
        assert!(first.exists());
        assert!(second.exists());
        assert_eq!(
            second.file_name().unwrap().to_string_lossy(),
            "sla_agent_report_20260302_120000_000_1.json"
        );

        let metrics = MetricsReport::new(SlaMetrics::default(), 7, fixed_now());
        let a = writer.save_metrics(&metrics).unwrap();
        let b = writer.save_metrics(&metrics).unwrap();
        assert_ne!(a, b);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 4);
    }
}
