//! Configuration for the SLA monitoring agent
//!
//! Settings load from an optional TOML file, then environment overrides
//! are applied, then the result is validated. Every section has defaults
//! so an empty file (or no file) yields a working configuration.

use crate::error::{Result, SlaError};
use crate::types::Priority;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, Level};

/// Longest look-back the daily analysis accepts (one leap year)
pub const MAX_ANALYSIS_WINDOW_HOURS: u32 = 24 * 366;

/// Complete agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaConfig {
    pub database: DatabaseConfig,
    pub reasoning: ReasoningConfig,
    pub escalation: EscalationConfig,
    pub app: AppConfig,
    pub sla_thresholds: SlaThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Minimum severity (1-10) at which a ticket needs escalation
    pub escalation_threshold: u8,

    /// Minimum confidence (50-100) attached to recommendations.
    /// Validated but not yet read by the reasoning engine.
    pub confidence_threshold: u8,

    /// Reserved; the built-in rules always run
    pub enable_pattern_detection: bool,
    /// Reserved; the built-in rules always run
    pub enable_predictive_analytics: bool,

    /// Look-back window for the daily analysis, in hours
    pub analysis_window_hours: u32,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: 8,
            confidence_threshold: 80,
            enable_pattern_detection: true,
            enable_predictive_analytics: true,
            analysis_window_hours: 24,
        }
    }
}

/// One row of the escalation matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationLevel {
    pub level: u8,
    pub target: String,
    pub urgency: String,
    pub timeframe_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub email: bool,
    pub slack: bool,
    pub dashboard: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            email: true,
            slack: true,
            dashboard: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub levels: Vec<EscalationLevel>,
    pub notifications: NotificationConfig,

    /// Record generated escalations in the database
    pub persist: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            levels: vec![
                EscalationLevel {
                    level: 1,
                    target: "team_lead".to_string(),
                    urgency: "high".to_string(),
                    timeframe_minutes: 60,
                },
                EscalationLevel {
                    level: 2,
                    target: "manager".to_string(),
                    urgency: "urgent".to_string(),
                    timeframe_minutes: 30,
                },
                EscalationLevel {
                    level: 3,
                    target: "director".to_string(),
                    urgency: "critical".to_string(),
                    timeframe_minutes: 15,
                },
            ],
            notifications: NotificationConfig::default(),
            persist: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level used when no `--log-level` flag is given
    pub log_level: String,

    /// Reserved for scheduled refresh; runs are only ever user-triggered
    pub refresh_interval_secs: u64,

    /// Reserved for scheduling the daily report (HH:MM)
    pub report_time: String,

    /// Directory reports are written to
    pub reports_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            refresh_interval_secs: 300,
            report_time: "08:00".to_string(),
            reports_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Level named by `flag`, else by `log_level`; unknown names mean info
    pub fn effective_log_level(&self, flag: Option<&str>) -> Level {
        match flag.unwrap_or(&self.log_level).to_ascii_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Response/resolution targets for one priority, in hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaTarget {
    /// Reserved; deadlines are derived from `resolution_hours` only
    pub response_hours: u32,
    pub resolution_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaThresholds {
    pub p1: SlaTarget,
    pub p2: SlaTarget,
    pub p3: SlaTarget,
    pub p4: SlaTarget,
    pub p5: SlaTarget,
}

impl SlaThresholds {
    pub fn for_priority(&self, priority: Priority) -> SlaTarget {
        match priority {
            Priority::P1 => self.p1,
            Priority::P2 => self.p2,
            Priority::P3 => self.p3,
            Priority::P4 => self.p4,
            Priority::P5 => self.p5,
        }
    }
}

impl Default for SlaThresholds {
    fn default() -> Self {
        let target = |response_hours, resolution_hours| SlaTarget {
            response_hours,
            resolution_hours,
        };
        Self {
            p1: target(1, 4),
            p2: target(2, 8),
            p3: target(4, 24),
            p4: target(8, 48),
            p5: target(24, 96),
        }
    }
}

/// Default database location under the platform data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("slamon")
        .join("slamon.db")
}

impl SlaConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: SlaConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the effective configuration: file (if any), then environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents)?
            }
            None => SlaConfig::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SLAMON_*` environment variables on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(path) = env_var("SLAMON_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(value) = env_var("SLAMON_ESCALATION_THRESHOLD") {
            self.reasoning.escalation_threshold = parse_env("SLAMON_ESCALATION_THRESHOLD", &value)?;
        }
        if let Some(value) = env_var("SLAMON_CONFIDENCE_THRESHOLD") {
            self.reasoning.confidence_threshold = parse_env("SLAMON_CONFIDENCE_THRESHOLD", &value)?;
        }
        if let Some(value) = env_var("SLAMON_ANALYSIS_WINDOW_HOURS") {
            self.reasoning.analysis_window_hours =
                parse_env("SLAMON_ANALYSIS_WINDOW_HOURS", &value)?;
        }
        if let Some(value) = env_var("SLAMON_EMAIL_NOTIFICATIONS") {
            self.escalation.notifications.email = parse_flag(&value);
        }
        if let Some(value) = env_var("SLAMON_SLACK_NOTIFICATIONS") {
            self.escalation.notifications.slack = parse_flag(&value);
        }
        if let Some(value) = env_var("SLAMON_LOG_LEVEL") {
            self.app.log_level = value;
        }
        if let Some(value) = env_var("SLAMON_REPORTS_DIR") {
            self.app.reports_dir = PathBuf::from(value);
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let threshold = self.reasoning.escalation_threshold;
        if !(1..=10).contains(&threshold) {
            return Err(SlaError::Config(format!(
                "escalation_threshold must be between 1 and 10, got {}",
                threshold
            )));
        }

        let confidence = self.reasoning.confidence_threshold;
        if !(50..=100).contains(&confidence) {
            return Err(SlaError::Config(format!(
                "confidence_threshold must be between 50 and 100, got {}",
                confidence
            )));
        }

        let window = self.reasoning.analysis_window_hours;
        if !(1..=MAX_ANALYSIS_WINDOW_HOURS).contains(&window) {
            return Err(SlaError::Config(format!(
                "analysis_window_hours must be between 1 and {}, got {}",
                MAX_ANALYSIS_WINDOW_HOURS, window
            )));
        }

        if self.escalation.levels.is_empty() {
            return Err(SlaError::Config(
                "escalation matrix must define at least one level".to_string(),
            ));
        }
        if self.escalation.levels.iter().any(|l| l.level == 0) {
            return Err(SlaError::Config(
                "escalation levels start at 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SlaError::Config(format!("{} has invalid value '{}'", name, value)))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
