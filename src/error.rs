//! Error types for the SLA monitoring agent
//!
//! Structured errors are defined with thiserror; binaries wrap them in
//! anyhow at the top level.

use thiserror::Error;

/// Main error type for slamon operations
#[derive(Error, Debug)]
pub enum SlaError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL driver error
    #[error("Database error: {0}")]
    Libsql(#[from] libsql::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input data (unknown priority, malformed timestamp, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Ticket not found
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("Failed to parse config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Agent run failed
    #[error("Agent error: {0}")]
    Agent(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for slamon operations
pub type Result<T> = std::result::Result<T, SlaError>;

impl From<anyhow::Error> for SlaError {
    fn from(err: anyhow::Error) -> Self {
        SlaError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SlaError::TicketNotFound("TKT-20260101-1000".to_string());
        assert_eq!(err.to_string(), "Ticket not found: TKT-20260101-1000");
    }

    #[test]
    fn test_toml_error_conversion() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("= broken");
        let err: SlaError = parsed.unwrap_err().into();
        assert!(matches!(err, SlaError::TomlParse(_)));
    }
}
