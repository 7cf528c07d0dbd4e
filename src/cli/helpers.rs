//! Shared helper functions for CLI commands

use slamon_core::{error::Result, SlaAgent, SlaConfig, StdoutSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Load configuration, letting `--db-path` win over file and environment
pub fn load_config(config_path: Option<&Path>, db_path: Option<String>) -> Result<SlaConfig> {
    let mut config = SlaConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = PathBuf::from(path);
    }
    debug!("Using database: {}", config.database.path.display());
    Ok(config)
}

/// Agent printing straight to stdout
pub async fn open_agent(config: SlaConfig) -> Result<SlaAgent> {
    SlaAgent::open(config, Arc::new(StdoutSink)).await
}

pub fn print_banner(title: &str) {
    println!("{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}
