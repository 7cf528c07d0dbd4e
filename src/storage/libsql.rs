//! LibSQL storage backend implementation
//!
//! Persists tickets, delayed portions and escalations in a local libSQL
//! (SQLite-compatible) database. The schema ships embedded in the binary
//! and is applied through a tracked migration runner.

use crate::error::{Result, SlaError};
use crate::metrics::{compliance_rate, round2, SlaMetrics};
use crate::storage::{TicketFilter, TicketStore};
use crate::types::{
    format_timestamp, parse_timestamp, CustomerTier, DelayPortion, EscalationRecord,
    EscalationStatus, Ticket, TicketId, TicketStatus, SlaStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{params, Builder, Connection, Database};
use tracing::{debug, info};

/// Embedded migrations, applied in order
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema.sql",
    include_str!("../../migrations/libsql/001_initial_schema.sql"),
)];

const TICKET_COLUMNS: &str = r#"
    t.ticket_id,
    t.ticket_title,
    s.service_name,
    c.customer_name,
    c.customer_tier,
    t.priority,
    t.status,
    t.creation_time,
    t.resolution_deadline,
    t.actual_resolution_time,
    t.assigned_team,
    t.sla_status,
    t.delay_minutes
"#;

const TICKET_JOINS: &str = r#"
    FROM tickets t
    LEFT JOIN services s ON t.service_id = s.service_id
    LEFT JOIN customers c ON t.customer_id = c.customer_id
"#;

/// Parse SQL file into individual statements
fn parse_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();

        // Skip comment-only and empty lines when not building a statement
        if current.is_empty() && (trimmed.is_empty() || trimmed.starts_with("--")) {
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);

        if trimmed.ends_with(';') {
            statements.push(current.clone());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements
}

/// Database connection mode
#[derive(Debug, Clone)]
pub enum ConnectionMode {
    /// Local file-based database
    Local(String),
    /// In-memory database (for testing)
    InMemory,
}

/// LibSQL ticket store
pub struct LibsqlStore {
    // Dropping the database closes the file; keep it alongside the connection.
    _db: Database,
    conn: Connection,
}

impl LibsqlStore {
    /// Validate database file before opening
    ///
    /// Returns `Ok(false)` when the file is absent and `must_exist` is false.
    fn validate_database_file(db_path: &str, must_exist: bool) -> Result<bool> {
        use std::fs;
        use std::path::Path;

        let path = Path::new(db_path);

        if !path.exists() {
            if must_exist {
                return Err(SlaError::Database(format!(
                    "Database file not found at '{}'. Run 'slamon setup' first or pass --db-path.",
                    db_path
                )));
            }
            return Ok(false);
        }

        // An empty file is a fresh database; anything else must carry the header
        let bytes = fs::read(path).map_err(|e| {
            SlaError::Database(format!("Cannot read database file at '{}': {}", db_path, e))
        })?;
        if bytes.is_empty() {
            return Ok(true);
        }
        if bytes.len() < 16 || &bytes[0..16] != b"SQLite format 3\0" {
            return Err(SlaError::Database(format!(
                "Database file at '{}' is corrupted or not a valid SQLite database.",
                db_path
            )));
        }

        debug!("Database file validation passed: {}", db_path);
        Ok(true)
    }

    /// Open a store, optionally creating the database file
    pub async fn new_with_validation(mode: ConnectionMode, create_if_missing: bool) -> Result<Self> {
        info!(
            "Connecting to LibSQL database: {:?} (create_if_missing: {})",
            mode, create_if_missing
        );

        let db = match mode {
            ConnectionMode::Local(ref path) => {
                let exists = Self::validate_database_file(path, !create_if_missing)?;
                if create_if_missing && !exists {
                    if let Some(parent) = std::path::Path::new(path).parent() {
                        if !parent.as_os_str().is_empty() {
                            std::fs::create_dir_all(parent).map_err(|e| {
                                SlaError::Database(format!(
                                    "Failed to create database directory {}: {}",
                                    parent.display(),
                                    e
                                ))
                            })?;
                        }
                    }
                }

                Builder::new_local(path).build().await.map_err(|e| {
                    SlaError::Database(format!("Failed to create local database: {}", e))
                })?
            }
            ConnectionMode::InMemory => Builder::new_local(":memory:").build().await.map_err(|e| {
                SlaError::Database(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let conn = db
            .connect()
            .map_err(|e| SlaError::Database(format!("Failed to get connection: {}", e)))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;").await?;

        info!("LibSQL database connection established");

        let store = Self { _db: db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open an existing database (fails if the file is missing)
    pub async fn new(mode: ConnectionMode) -> Result<Self> {
        Self::new_with_validation(mode, false).await
    }

    /// Open or create a local database file
    pub async fn open_or_create(path: &str) -> Result<Self> {
        Self::new_with_validation(ConnectionMode::Local(path.to_string()), true).await
    }

    /// In-memory store with the schema applied
    pub async fn in_memory() -> Result<Self> {
        Self::new_with_validation(ConnectionMode::InMemory, true).await
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        debug!("Running database migrations...");

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS _migrations_applied (
                    migration_name TEXT PRIMARY KEY,
                    applied_at INTEGER NOT NULL
                )",
                params![],
            )
            .await
            .map_err(|e| SlaError::Migration(format!("Failed to create migrations table: {}", e)))?;

        for (name, sql) in MIGRATIONS {
            let mut rows = self
                .conn
                .query(
                    "SELECT COUNT(*) FROM _migrations_applied WHERE migration_name = ?",
                    params![*name],
                )
                .await?;
            let already_applied = match rows.next().await? {
                Some(row) => row.get::<i64>(0).unwrap_or(0) > 0,
                None => false,
            };
            if already_applied {
                debug!("Skipping already applied migration: {}", name);
                continue;
            }

            let statements = parse_sql_statements(sql);
            debug!("Parsed {} statements from {}", statements.len(), name);
            for statement in &statements {
                self.conn.execute(statement, params![]).await.map_err(|e| {
                    SlaError::Migration(format!("Failed to execute {}: {}", name, e))
                })?;
            }

            self.conn
                .execute(
                    "INSERT INTO _migrations_applied (migration_name, applied_at) VALUES (?, ?)",
                    params![*name, Utc::now().timestamp()],
                )
                .await?;
            info!("Executed migration: {}", name);
        }

        Ok(())
    }

    fn row_to_ticket(row: &libsql::Row) -> Result<Ticket> {
        let id: String = row.get(0)?;
        let title: String = row.get(1)?;
        let service: Option<String> = row.get(2)?;
        let customer: Option<String> = row.get(3)?;
        let tier: Option<String> = row.get(4)?;
        let priority: String = row.get(5)?;
        let status: String = row.get(6)?;
        let created_at: String = row.get(7)?;
        let deadline: String = row.get(8)?;
        let resolved_at: Option<String> = row.get(9)?;
        let team: String = row.get(10)?;
        let sla_status: String = row.get(11)?;
        let delay_minutes: i64 = row.get(12)?;

        Ok(Ticket {
            id: TicketId(id),
            title,
            service: service.unwrap_or_else(|| "Unknown".to_string()),
            customer,
            customer_tier: tier.map(|t| t.parse::<CustomerTier>()).transpose()?,
            priority: priority.parse()?,
            status: status.parse()?,
            created_at: parse_timestamp(&created_at)?,
            resolution_deadline: parse_timestamp(&deadline)?,
            resolved_at: resolved_at.as_deref().map(parse_timestamp).transpose()?,
            assigned_team: team,
            sla_status: sla_status.parse()?,
            delay_minutes,
        })
    }

    fn row_to_delay(row: &libsql::Row) -> Result<DelayPortion> {
        let id: i64 = row.get(0)?;
        let ticket_id: String = row.get(1)?;
        let delay_type: String = row.get(2)?;
        let started_at: String = row.get(3)?;
        let ended_at: Option<String> = row.get(4)?;
        let duration_minutes: i64 = row.get(5)?;
        let status: String = row.get(6)?;
        let impact_score: i64 = row.get(7)?;
        let resolution_notes: String = row.get(8)?;

        Ok(DelayPortion {
            id: Some(id),
            ticket_id: TicketId(ticket_id),
            delay_type: delay_type.parse()?,
            started_at: parse_timestamp(&started_at)?,
            ended_at: ended_at.as_deref().map(parse_timestamp).transpose()?,
            duration_minutes,
            status: status.parse()?,
            impact_score: impact_score.clamp(0, 10) as u8,
            resolution_notes,
        })
    }

    fn row_to_escalation(row: &libsql::Row) -> Result<EscalationRecord> {
        let id: i64 = row.get(0)?;
        let ticket_id: String = row.get(1)?;
        let level: i64 = row.get(2)?;
        let reason: String = row.get(3)?;
        let escalated_at: String = row.get(4)?;
        let status: String = row.get(5)?;
        let resolved_at: Option<String> = row.get(6)?;

        Ok(EscalationRecord {
            id: Some(id),
            ticket_id: TicketId(ticket_id),
            level: level.clamp(0, u8::MAX as i64) as u8,
            reason,
            escalated_at: parse_timestamp(&escalated_at)?,
            status: status.parse()?,
            resolved_at: resolved_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }

    /// Look up a service by name, inserting it if absent
    async fn ensure_service(&self, name: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO services (service_name) VALUES (?)",
                params![name],
            )
            .await?;
        self.lookup_id("SELECT service_id FROM services WHERE service_name = ?", name)
            .await
    }

    /// Look up a customer by name, inserting it if absent
    async fn ensure_customer(&self, name: &str, tier: Option<CustomerTier>) -> Result<i64> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO customers (customer_name, customer_tier) VALUES (?, ?)",
                params![name, tier.map(|t| t.as_str().to_string())],
            )
            .await?;
        self.lookup_id("SELECT customer_id FROM customers WHERE customer_name = ?", name)
            .await
    }

    async fn lookup_id(&self, sql: &str, key: &str) -> Result<i64> {
        let mut rows = self.conn.query(sql, params![key]).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?),
            None => Err(SlaError::Database(format!("Lookup failed for '{}'", key))),
        }
    }

    /// Register a service with its category and default SLA
    pub async fn upsert_service(&self, name: &str, category: &str, default_sla_hours: i64) -> Result<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO services (service_name, service_category, default_sla_hours)
                VALUES (?, ?, ?)
                ON CONFLICT(service_name) DO UPDATE SET
                    service_category = excluded.service_category,
                    default_sla_hours = excluded.default_sla_hours
                "#,
                params![name, category, default_sla_hours],
            )
            .await?;
        self.lookup_id("SELECT service_id FROM services WHERE service_name = ?", name)
            .await
    }

    /// Register a customer with tier and account manager
    pub async fn upsert_customer(
        &self,
        name: &str,
        tier: CustomerTier,
        account_manager: &str,
    ) -> Result<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO customers (customer_name, customer_tier, account_manager)
                VALUES (?, ?, ?)
                ON CONFLICT(customer_name) DO UPDATE SET
                    customer_tier = excluded.customer_tier,
                    account_manager = excluded.account_manager
                "#,
                params![name, tier.as_str(), account_manager],
            )
            .await?;
        self.lookup_id("SELECT customer_id FROM customers WHERE customer_name = ?", name)
            .await
    }

    async fn collect_tickets(&self, sql: &str, values: Vec<libsql::Value>) -> Result<Vec<Ticket>> {
        let mut rows = self
            .conn
            .query(sql, libsql::params_from_iter(values))
            .await?;
        let mut tickets = Vec::new();
        while let Some(row) = rows.next().await? {
            tickets.push(Self::row_to_ticket(&row)?);
        }
        Ok(tickets)
    }
}

#[async_trait]
impl TicketStore for LibsqlStore {
    async fn health_check(&self) -> Result<()> {
        self.conn
            .query("SELECT 1", ())
            .await
            .map_err(|e| SlaError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    async fn tickets(&self, filter: &TicketFilter, limit: usize) -> Result<Vec<Ticket>> {
        let mut sql = format!("SELECT {} {} WHERE 1=1", TICKET_COLUMNS, TICKET_JOINS);
        let mut values = Vec::new();

        if let Some(status) = filter.sla_status {
            sql.push_str(" AND t.sla_status = ?");
            values.push(libsql::Value::Text(status.as_str().to_string()));
        }
        if let Some(priority) = filter.priority {
            sql.push_str(" AND t.priority = ?");
            values.push(libsql::Value::Text(priority.as_str().to_string()));
        }
        if let Some(team) = &filter.assigned_team {
            sql.push_str(" AND t.assigned_team = ?");
            values.push(libsql::Value::Text(team.clone()));
        }
        if let Some(after) = &filter.created_after {
            sql.push_str(" AND t.creation_time >= ?");
            values.push(libsql::Value::Text(format_timestamp(after)));
        }
        if let Some(before) = &filter.created_before {
            sql.push_str(" AND t.creation_time <= ?");
            values.push(libsql::Value::Text(format_timestamp(before)));
        }

        // "P1" sorts before "P2", so ascending text order is most urgent first
        sql.push_str(" ORDER BY t.priority ASC, t.creation_time DESC LIMIT ?");
        values.push(libsql::Value::Integer(limit as i64));

        let tickets = self.collect_tickets(&sql, values).await?;
        debug!("Ticket query returned {} rows", tickets.len());
        Ok(tickets)
    }

    async fn tickets_since(&self, since: DateTime<Utc>) -> Result<Vec<Ticket>> {
        let sql = format!(
            "SELECT {} {} WHERE t.creation_time >= ? ORDER BY t.priority ASC, t.resolution_deadline ASC",
            TICKET_COLUMNS, TICKET_JOINS
        );
        self.collect_tickets(&sql, vec![libsql::Value::Text(format_timestamp(&since))])
            .await
    }

    async fn get_ticket(&self, id: &TicketId) -> Result<Ticket> {
        let sql = format!("SELECT {} {} WHERE t.ticket_id = ?", TICKET_COLUMNS, TICKET_JOINS);
        self.collect_tickets(&sql, vec![libsql::Value::Text(id.0.clone())])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SlaError::TicketNotFound(id.to_string()))
    }

    async fn delays_for(&self, ticket_ids: &[TicketId]) -> Result<Vec<DelayPortion>> {
        if ticket_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ticket_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT delay_id, ticket_id, delay_type, delay_start, delay_end,
                   delay_duration_minutes, delay_status, impact_score, resolution_notes
            FROM sla_delays
            WHERE ticket_id IN ({})
            ORDER BY delay_start DESC
            "#,
            placeholders
        );
        let values: Vec<libsql::Value> = ticket_ids
            .iter()
            .map(|id| libsql::Value::Text(id.0.clone()))
            .collect();

        let mut rows = self
            .conn
            .query(&sql, libsql::params_from_iter(values))
            .await?;
        let mut delays = Vec::new();
        while let Some(row) = rows.next().await? {
            delays.push(Self::row_to_delay(&row)?);
        }
        Ok(delays)
    }

    async fn escalations(&self, status: Option<EscalationStatus>) -> Result<Vec<EscalationRecord>> {
        let base = r#"
            SELECT escalation_id, ticket_id, escalation_level, escalation_reason,
                   escalation_time, escalation_status, resolved_time
            FROM escalations
        "#;
        let order = " ORDER BY escalation_level DESC, escalation_time DESC";

        let mut rows = match status {
            Some(status) => {
                let sql = format!("{} WHERE escalation_status = ?{}", base, order);
                self.conn.query(&sql, params![status.as_str()]).await?
            }
            None => {
                let sql = format!("{}{}", base, order);
                self.conn.query(&sql, params![]).await?
            }
        };

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::row_to_escalation(&row)?);
        }
        Ok(records)
    }

    async fn sla_metrics(&self, since: DateTime<Utc>) -> Result<SlaMetrics> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT
                    COUNT(*),
                    SUM(CASE WHEN sla_status = 'within_sla' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN sla_status = 'delayed' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN sla_status = 'at_risk' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN sla_status = 'breached' THEN 1 ELSE 0 END),
                    AVG(delay_minutes)
                FROM tickets
                WHERE creation_time >= ?
                "#,
                params![format_timestamp(&since)],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(SlaMetrics::default());
        };

        let total = row.get::<i64>(0)?.max(0) as usize;
        let count = |idx: i32| -> Result<usize> {
            Ok(row.get::<Option<i64>>(idx)?.unwrap_or(0).max(0) as usize)
        };
        let within_sla = count(1)?;

        Ok(SlaMetrics {
            total_tickets: total,
            within_sla,
            delayed: count(2)?,
            at_risk: count(3)?,
            breached: count(4)?,
            avg_delay_minutes: round2(row.get::<Option<f64>>(5)?.unwrap_or(0.0)),
            compliance_rate: compliance_rate(within_sla, total),
        })
    }

    async fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        let service_id = self.ensure_service(&ticket.service).await?;
        let customer_id = match &ticket.customer {
            Some(name) => Some(self.ensure_customer(name, ticket.customer_tier).await?),
            None => None,
        };

        self.conn
            .execute(
                r#"
                INSERT INTO tickets
                (ticket_id, ticket_title, service_id, customer_id, priority, status,
                 creation_time, resolution_deadline, actual_resolution_time,
                 assigned_team, sla_status, delay_minutes)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    ticket.id.0.clone(),
                    ticket.title.clone(),
                    service_id,
                    customer_id,
                    ticket.priority.as_str(),
                    ticket.status.as_str(),
                    format_timestamp(&ticket.created_at),
                    format_timestamp(&ticket.resolution_deadline),
                    ticket.resolved_at.as_ref().map(format_timestamp),
                    ticket.assigned_team.clone(),
                    ticket.sla_status.as_str(),
                    ticket.delay_minutes
                ],
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE") {
                    SlaError::Validation(format!("Ticket already exists: {}", ticket.id))
                } else {
                    SlaError::Libsql(e)
                }
            })?;

        debug!("Created ticket {}", ticket.id);
        Ok(())
    }

    async fn update_ticket_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
        sla_status: Option<SlaStatus>,
    ) -> Result<()> {
        let affected = match sla_status {
            Some(sla) => {
                self.conn
                    .execute(
                        "UPDATE tickets SET status = ?, sla_status = ? WHERE ticket_id = ?",
                        params![status.as_str(), sla.as_str(), id.0.clone()],
                    )
                    .await?
            }
            None => {
                self.conn
                    .execute(
                        "UPDATE tickets SET status = ? WHERE ticket_id = ?",
                        params![status.as_str(), id.0.clone()],
                    )
                    .await?
            }
        };

        if affected == 0 {
            return Err(SlaError::TicketNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn add_delay(&self, delay: &DelayPortion) -> Result<i64> {
        if !(1..=10).contains(&delay.impact_score) {
            return Err(SlaError::Validation(format!(
                "impact_score must be between 1 and 10, got {}",
                delay.impact_score
            )));
        }

        self.conn
            .execute(
                r#"
                INSERT INTO sla_delays
                (ticket_id, delay_type, delay_start, delay_end, delay_duration_minutes,
                 delay_status, impact_score, resolution_notes)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    delay.ticket_id.0.clone(),
                    delay.delay_type.as_str(),
                    format_timestamp(&delay.started_at),
                    delay.ended_at.as_ref().map(format_timestamp),
                    delay.duration_minutes,
                    delay.status.as_str(),
                    delay.impact_score as i64,
                    delay.resolution_notes.clone()
                ],
            )
            .await?;
        Ok(self.conn.last_insert_rowid())
    }

    async fn record_escalation(&self, record: &EscalationRecord) -> Result<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO escalations
                (ticket_id, escalation_level, escalation_reason, escalation_time,
                 escalation_status, resolved_time)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
                params![
                    record.ticket_id.0.clone(),
                    record.level as i64,
                    record.reason.clone(),
                    format_timestamp(&record.escalated_at),
                    record.status.as_str(),
                    record.resolved_at.as_ref().map(format_timestamp)
                ],
            )
            .await?;
        Ok(self.conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sql_statements_skips_comments() {
        let sql = "-- header\n\nCREATE TABLE a (id INTEGER);\n-- note\nCREATE INDEX i ON a(id);\n";
        let statements = parse_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE a"));
        assert!(statements[1].starts_with("CREATE INDEX i"));
    }

    #[test]
    fn test_embedded_schema_defines_all_tables() {
        let statements = parse_sql_statements(MIGRATIONS[0].1);
        for table in ["services", "customers", "tickets", "sla_delays", "escalations"] {
            let needle = format!("CREATE TABLE IF NOT EXISTS {} ", table);
            assert!(
                statements.iter().any(|s| s.contains(&needle)),
                "missing table {}",
                table
            );
        }
    }

    #[test]
    fn test_missing_database_requires_creation() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        let path = path.to_string_lossy();

        assert!(LibsqlStore::validate_database_file(&path, true).is_err());
        assert!(!LibsqlStore::validate_database_file(&path, false).unwrap());
    }

    #[test]
    fn test_non_sqlite_file_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bogus.db");
        std::fs::write(&path, "definitely not a database file").unwrap();

        let result = LibsqlStore::validate_database_file(&path.to_string_lossy(), true);
        assert!(matches!(result, Err(SlaError::Database(_))));
    }
}
